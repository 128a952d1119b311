use log::{debug, info};

use super::event::{EventKind, FlightEvent, PhaseOutcome};
use crate::errors::FlightError;
use crate::gnc::{Controller, PhaseStatus, Setpoint, Tick};
use crate::link::{apply_setpoint, dispatch, Clock, Vessel};
use crate::telemetry::Snapshot;
use crate::vehicle::{FuelSupervisor, StagingTrigger};

// ---------------------------------------------------------------------------
// Run limits and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunLimits {
    /// Give up with `FlightError::TickLimit` after this many ticks.
    pub max_ticks: Option<u64>,
    /// Keep every snapshot and setpoint in the report.
    pub record_trajectory: bool,
}

impl RunLimits {
    pub fn recording(max_ticks: u64) -> Self {
        Self { max_ticks: Some(max_ticks), record_trajectory: true }
    }
}

/// Everything a finished phase leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReport {
    pub name: String,
    pub outcome: PhaseOutcome,
    pub ticks: u64,
    /// One entry per tick when recording, empty otherwise.
    pub trajectory: Vec<Snapshot>,
    pub setpoints: Vec<Option<Setpoint>>,
    pub events: Vec<FlightEvent>,
}

impl PhaseReport {
    pub fn staging_events(&self) -> usize {
        self.events.iter().filter(|e| matches!(e.kind, EventKind::Staged { .. })).count()
    }
}

// ---------------------------------------------------------------------------
// Polling loop
// ---------------------------------------------------------------------------

fn staging_check<V: Vessel + ?Sized>(
    vessel: &mut V,
    supervisor: &mut FuelSupervisor,
    snapshot: &Snapshot,
    trigger: StagingTrigger,
) -> Result<f64, FlightError> {
    let fuel = match trigger {
        StagingTrigger::FuelDepleted => supervisor.check_and_maybe_stage(snapshot, vessel, true)?,
        StagingTrigger::ThrustLost => {
            let fuel = supervisor.check_and_maybe_stage(snapshot, vessel, false)?;
            supervisor.check_thrust_and_maybe_stage(snapshot, vessel)?;
            fuel
        }
        StagingTrigger::Off => supervisor.check_and_maybe_stage(snapshot, vessel, false)?,
    };
    Ok(fuel)
}

/// Fly one phase to completion.
///
/// Each tick waits `controller.interval()`, samples one snapshot, lets the
/// fuel supervisor stage if the phase allows it, then applies the
/// controller's setpoint and commands. The start commands go out before the
/// first tick and the finish commands right after the controller reports
/// `Done`.
pub fn run_phase<V: Vessel + ?Sized>(
    vessel: &mut V,
    controller: &mut dyn Controller,
    supervisor: &mut FuelSupervisor,
    clock: &mut dyn Clock,
    limits: &RunLimits,
) -> Result<PhaseReport, FlightError> {
    let name = controller.name().to_string();
    let first = vessel.snapshot(controller.scope())?;
    info!("Starting {name} at ut {:.1}", first.ut);
    for cmd in controller.start(&first) {
        dispatch(vessel, &cmd)?;
    }

    let mut trajectory = vec![];
    let mut setpoints = vec![];
    let mut events = vec![];
    let mut last_ut = first.ut;
    let mut ticks: u64 = 0;

    loop {
        if limits.max_ticks.is_some_and(|max| ticks >= max) {
            return Err(FlightError::TickLimit { ticks });
        }

        let interval = controller.interval();
        clock.sleep(interval);
        let snapshot = vessel.snapshot(controller.scope())?;

        // Host time may stand still (paused, scripted frames).
        let dt = if snapshot.ut > last_ut { snapshot.ut - last_ut } else { interval.as_secs_f64() };
        last_ut = snapshot.ut;

        let fuel = staging_check(vessel, supervisor, &snapshot, controller.staging())?;
        if let Some(from) = supervisor.take_staged() {
            events.push(FlightEvent::new(snapshot.ut, EventKind::Staged { from }));
        }

        let guidance = controller.control(&Tick { snapshot: &snapshot, dt, fuel });
        if let Some(setpoint) = &guidance.setpoint {
            apply_setpoint(vessel, setpoint)?;
        }
        for cmd in &guidance.commands {
            dispatch(vessel, cmd)?;
        }
        ticks += 1;
        debug!("{name} tick {ticks}: {:?}", guidance.setpoint);

        events.extend(guidance.events);
        if limits.record_trajectory {
            trajectory.push(snapshot);
            setpoints.push(guidance.setpoint);
        }

        if let PhaseStatus::Done(outcome) = guidance.status {
            for cmd in controller.finish(&outcome) {
                dispatch(vessel, &cmd)?;
            }
            info!("{name} finished after {ticks} ticks: {outcome:?}");
            return Ok(PhaseReport { name, outcome, ticks, trajectory, setpoints, events });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
