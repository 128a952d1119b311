use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use super::command::{Command, Guidance, Setpoint, Tick};
use super::controller::{seconds, Controller};
use crate::nav::{angle_between_headings, clip};
use crate::sim::event::{EventKind, FlightEvent, PhaseOutcome};
use crate::telemetry::Snapshot;

// ---------------------------------------------------------------------------
// Ascent configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AscentConfig {
    pub target_apoapsis_altitude: f64,
    pub gravity_turn_start_altitude: f64,
    pub gravity_turn_end_altitude: f64,
    /// Fixed launch azimuth, deg.
    pub launch_heading: f64,
    pub pitch_tolerance: f64,
    pub heading_tolerance: f64,
    /// Heading tolerance once the apoapsis hold has latched.
    pub hold_heading_tolerance: f64,
    pub throttle_up_step: f64,
    pub throttle_down_step: f64,
    pub hold_throttle_up_step: f64,
    pub hold_throttle_down_step: f64,
    /// Keep burning level after the apoapsis target until the stage is dry.
    pub boost_until_out_of_fuel: bool,
    /// Altitude above which the apoapsis hold may latch.
    pub hold_altitude: f64,
    /// The phase never ends below this altitude.
    pub min_safety_altitude: f64,
    /// Supervisor fuel reading treated as empty.
    pub fuel_epsilon: f64,
    pub interval: f64,
}

impl Default for AscentConfig {
    fn default() -> Self {
        Self {
            target_apoapsis_altitude: 100_000.0,
            gravity_turn_start_altitude: 10_000.0,
            gravity_turn_end_altitude: 60_000.0,
            launch_heading: 90.0,
            pitch_tolerance: 5.0,
            heading_tolerance: 10.0,
            hold_heading_tolerance: 30.0,
            throttle_up_step: 0.02,
            throttle_down_step: 0.2,
            hold_throttle_up_step: 0.03,
            hold_throttle_down_step: 0.1,
            boost_until_out_of_fuel: false,
            hold_altitude: 20_000.0,
            min_safety_altitude: 1_000.0,
            fuel_epsilon: 0.1,
            interval: 0.01,
        }
    }
}

// ---------------------------------------------------------------------------
// Pitch program
// ---------------------------------------------------------------------------

/// Desired pitch (deg above horizon) for the gravity turn:
/// - below `start`: vertical (90)
/// - between `start` and `end`: linear from 90 down to 0
/// - above `end`: horizontal (0)
pub fn gravity_turn_pitch(altitude: f64, start: f64, end: f64) -> f64 {
    if altitude <= start {
        return 90.0;
    }
    let frac = (altitude - start) / (end - start);
    clip(0.0, 90.0 - frac * 90.0, 90.0)
}

// ---------------------------------------------------------------------------
// Ascent state machine
// ---------------------------------------------------------------------------

/// Ascent phases. Every transition is forward-only; `ApoapsisHold` in
/// particular never returns to the gravity turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AscentPhase {
    VerticalRise,
    GravityTurn,
    ApoapsisHold,
    Done,
}

#[derive(Debug, Clone)]
pub struct AscentGuidance {
    pub config: AscentConfig,
    phase: AscentPhase,
}

impl AscentGuidance {
    pub fn new(config: AscentConfig) -> Self {
        Self { config, phase: AscentPhase::VerticalRise }
    }

    pub fn phase(&self) -> AscentPhase {
        self.phase
    }

    /// Advance the state machine for the current altitude and apoapsis.
    fn advance(&mut self, snap: &Snapshot, events: &mut Vec<FlightEvent>) {
        let cfg = &self.config;
        let altitude = snap.mean_altitude;

        if self.phase == AscentPhase::VerticalRise && altitude > cfg.gravity_turn_start_altitude {
            info!("Starting gravity turn at {altitude:.0} m");
            self.phase = AscentPhase::GravityTurn;
            events.push(FlightEvent::new(snap.ut, EventKind::GravityTurnStarted));
        }

        let may_latch = matches!(self.phase, AscentPhase::VerticalRise | AscentPhase::GravityTurn);
        if may_latch
            && cfg.boost_until_out_of_fuel
            && altitude > cfg.hold_altitude
            && snap.apoapsis_altitude > cfg.target_apoapsis_altitude
        {
            info!(
                "Apoapsis {:.0} m above target, levelling out to raise periapsis",
                snap.apoapsis_altitude
            );
            self.phase = AscentPhase::ApoapsisHold;
            events.push(FlightEvent::new(snap.ut, EventKind::ApoapsisHoldLatched));
        }
    }

    fn target_pitch(&self, altitude: f64) -> f64 {
        match self.phase {
            AscentPhase::VerticalRise => 90.0,
            AscentPhase::GravityTurn => gravity_turn_pitch(
                altitude,
                self.config.gravity_turn_start_altitude,
                self.config.gravity_turn_end_altitude,
            ),
            AscentPhase::ApoapsisHold | AscentPhase::Done => 0.0,
        }
    }

    fn finished(&self, snap: &Snapshot, fuel: f64) -> bool {
        let cfg = &self.config;
        snap.apoapsis_altitude >= cfg.target_apoapsis_altitude
            && snap.mean_altitude >= cfg.min_safety_altitude
            && (!cfg.boost_until_out_of_fuel || fuel < cfg.fuel_epsilon)
    }
}

impl Controller for AscentGuidance {
    fn control(&mut self, tick: &Tick<'_>) -> Guidance {
        let snap = tick.snapshot;
        if self.phase == AscentPhase::Done {
            return Guidance::done(PhaseOutcome::Completed);
        }

        let mut events = vec![];
        self.advance(snap, &mut events);

        if self.finished(snap, tick.fuel) {
            info!("Apoapsis of {:.0} m reached. Ending ascent.", snap.apoapsis_altitude);
            self.phase = AscentPhase::Done;
            let mut g = Guidance::done(PhaseOutcome::Completed);
            g.setpoint = Some(Setpoint { throttle: 0.0, ..Setpoint::default() });
            g.events = events;
            g.events.push(FlightEvent::new(
                snap.ut,
                EventKind::ApoapsisReached { apoapsis: snap.apoapsis_altitude },
            ));
            return g;
        }

        let cfg = &self.config;
        let pitch = self.target_pitch(snap.mean_altitude);
        let heading = cfg.launch_heading;

        let throttle = if self.phase == AscentPhase::VerticalRise {
            1.0
        } else {
            let hold = self.phase == AscentPhase::ApoapsisHold;
            let (heading_tol, up, down) = if hold {
                (cfg.hold_heading_tolerance, cfg.hold_throttle_up_step, cfg.hold_throttle_down_step)
            } else {
                (cfg.heading_tolerance, cfg.throttle_up_step, cfg.throttle_down_step)
            };
            let facing = (pitch - snap.pitch).abs() < cfg.pitch_tolerance
                && angle_between_headings(heading, snap.heading) < heading_tol;
            // Heading is meaningless while pointing straight up.
            if !facing && pitch < 90.0 {
                snap.throttle - down
            } else {
                snap.throttle + up
            }
        };

        let mut g = Guidance::running(Setpoint::pitch_heading(pitch, heading, throttle));
        g.events = events;
        g
    }

    fn start(&mut self, _snapshot: &Snapshot) -> Vec<Command> {
        vec![Command::StabilityAssist(false), Command::EngageAutopilot]
    }

    fn finish(&mut self, _outcome: &PhaseOutcome) -> Vec<Command> {
        vec![Command::DisengageAutopilot, Command::StabilityAssist(true)]
    }

    fn interval(&self) -> Duration {
        seconds(self.config.interval)
    }

    fn name(&self) -> &str {
        "AscentGuidance"
    }
}
