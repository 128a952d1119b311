use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::command::{AutopilotTuning, Command, Guidance, Setpoint, Tick};
use super::controller::{seconds, Controller};
use super::waypoint::ContractSelector;
use crate::nav::{bearing, clip, distance};
use crate::sim::event::{EventKind, FlightEvent, PhaseOutcome};
use crate::telemetry::{Experiment, Scope, Snapshot, Waypoint, WaypointId};
use crate::vehicle::StagingTrigger;

// ---------------------------------------------------------------------------
// Cruise configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruiseConfig {
    pub target_height: f64,
    pub min_height: f64,
    pub max_pitch_angle: f64,
    /// Experiments run once the target is this close, m.
    pub proximity: f64,
    /// Waypoints with a higher bedrock altitude are never targeted, m.
    pub max_altitude_ceiling: f64,
    /// Waypoint icon name -> substring of the experiment part that serves it.
    pub equipment: BTreeMap<String, String>,
    pub tuning: AutopilotTuning,
    pub interval: f64,
}

impl Default for CruiseConfig {
    fn default() -> Self {
        let equipment = [
            ("report", "Cockpit"),
            ("thermometer", "sensorThermometer"),
            ("barometer", "sensorBarometer"),
            ("seismic", "sensorAccelerometer"),
            ("gravity", "sensorGravimeter"),
        ]
        .into_iter()
        .map(|(icon, part)| (icon.to_string(), part.to_string()))
        .collect();

        Self {
            target_height: 5_000.0,
            min_height: 1_000.0,
            max_pitch_angle: 30.0,
            proximity: 1_500.0,
            max_altitude_ceiling: 15_000.0,
            equipment,
            tuning: AutopilotTuning {
                roll_threshold: 5.0,
                deceleration_time: [10.0, 5.0, 5.0],
                attenuation_angle: [1.0, 1.0, 1.0],
            },
            interval: 1.0,
        }
    }
}

/// Linear climb/descent law shared by cruise and takeoff: full `max_pitch`
/// at or below `min_height`, zero at `target_height`, negative above it.
pub fn band_pitch(altitude: f64, target_height: f64, min_height: f64, max_pitch: f64) -> f64 {
    clip(-1.0, (target_height - altitude) / (target_height - min_height), 1.0) * max_pitch
}

// ---------------------------------------------------------------------------
// Cruise controller
// ---------------------------------------------------------------------------

/// Flies from one contract waypoint to the next, running the matching
/// experiment at each.
#[derive(Debug, Clone)]
pub struct CruiseController {
    pub config: CruiseConfig,
    selector: ContractSelector,
    /// Target the autopilot was last engaged for.
    engaged_for: Option<WaypointId>,
}

impl CruiseController {
    pub fn new(config: CruiseConfig) -> Self {
        let selector = ContractSelector::new(config.max_altitude_ceiling);
        Self { config, selector, engaged_for: None }
    }

    pub fn target(&self) -> Option<&Waypoint> {
        self.selector.current()
    }

    /// Experiment whose part name contains the equipment mapped to `waypoint`.
    pub fn equipment_for<'a>(&self, waypoint: &Waypoint, experiments: &'a [Experiment]) -> Option<&'a Experiment> {
        let part = self.config.equipment.get(waypoint.kind.icon())?;
        experiments.iter().find(|e| e.part_name.contains(part.as_str()))
    }

    fn clear_target(&mut self, ut: f64, events: &mut Vec<FlightEvent>) {
        if let Some(done) = self.selector.clear() {
            events.push(FlightEvent::new(ut, EventKind::TargetCleared { name: done.name }));
        }
    }
}

impl Controller for CruiseController {
    fn control(&mut self, tick: &Tick<'_>) -> Guidance {
        let snap = tick.snapshot;

        let Some(target) = self.selector.select(snap.position, &snap.waypoints).cloned() else {
            info!("No waypoints available, stopping cruise");
            return Guidance::done(PhaseOutcome::NoTargetAvailable);
        };

        let mut commands = vec![];
        let mut events = vec![];
        let dist = distance(snap.position, target.position);

        if self.engaged_for != Some(target.id) {
            info!("Heading to {} ({:?}), {:.0} m away", target.name, target.kind, dist);
            commands.push(Command::EngageAutopilot);
            commands.push(Command::Tune(self.config.tuning));
            events.push(FlightEvent::new(
                snap.ut,
                EventKind::TargetAcquired { name: target.name.clone(), distance: dist },
            ));
            self.engaged_for = Some(target.id);
        }

        let cfg = &self.config;
        let pitch = band_pitch(snap.bedrock_altitude, cfg.target_height, cfg.min_height, cfg.max_pitch_angle);
        let heading = bearing(snap.position, target.position);
        debug!("Distance to {}: {dist:.0} m, pitch {pitch:.1}, heading {heading:.1}", target.name);

        if dist < cfg.proximity {
            match self.equipment_for(&target, &snap.experiments) {
                Some(exp) => {
                    info!("Reached {}, running {}", target.name, exp.part_name);
                    if exp.has_data {
                        commands.push(Command::ResetExperiment(exp.id));
                    }
                    commands.push(Command::RunExperiment(exp.id));
                    events.push(FlightEvent::new(
                        snap.ut,
                        EventKind::ExperimentRun {
                            part: exp.part_name.clone(),
                            science: exp.subject.map_or(0.0, |s| s.obtainable()),
                        },
                    ));
                }
                None => warn!(
                    "Reached {} but no equipment serves waypoint kind '{}', skipping it",
                    target.name,
                    target.kind.icon()
                ),
            }
            self.clear_target(snap.ut, &mut events);
        }

        let mut g = Guidance::running(Setpoint::pitch_heading(pitch, heading, 1.0));
        g.commands = commands;
        g.events = events;
        g
    }

    fn finish(&mut self, _outcome: &PhaseOutcome) -> Vec<Command> {
        vec![Command::DisengageAutopilot]
    }

    fn scope(&self) -> Scope {
        Scope { waypoints: true, experiments: true, ..Scope::BASIC }
    }

    fn interval(&self) -> Duration {
        seconds(self.config.interval)
    }

    fn staging(&self) -> StagingTrigger {
        StagingTrigger::Off
    }

    fn name(&self) -> &str {
        "CruiseController"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc_mod::command::PhaseStatus;
    use crate::nav::KERBIN_RADIUS;
    use crate::telemetry::{ExperimentId, GeoPoint, ScienceSubject, WaypointId, WaypointKind};
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn east(meters: f64) -> GeoPoint {
        GeoPoint::new(0.0, (meters / KERBIN_RADIUS).to_degrees())
    }

    fn wp(id: u64, name: &str, meters: f64, kind: WaypointKind) -> Waypoint {
        Waypoint {
            id: WaypointId(id),
            name: name.into(),
            position: east(meters),
            has_contract: true,
            near_surface: true,
            altitude_ceiling: 100.0,
            kind,
        }
    }

    fn thermometer(has_data: bool) -> Experiment {
        Experiment {
            id: ExperimentId(3),
            part_name: "sensorThermometer.v2".into(),
            available: true,
            inoperable: false,
            has_data,
            rerunnable: true,
            stored_science: 0.0,
            subject: Some(ScienceSubject { scientific_value: 1.0, science_cap: 8.0 }),
        }
    }

    fn snap(waypoints: Vec<Waypoint>, experiments: Vec<Experiment>) -> Snapshot {
        Snapshot {
            ut: 10.0,
            position: GeoPoint::new(0.0, 0.0),
            bedrock_altitude: 3_000.0,
            waypoints,
            experiments,
            ..Snapshot::default()
        }
    }

    fn tick(ctl: &mut CruiseController, s: &Snapshot) -> Guidance {
        ctl.control(&Tick { snapshot: s, dt: 1.0, fuel: 0.0 })
    }

    #[rstest]
    #[case(1_000.0, 30.0)]
    #[case(500.0, 30.0)]
    #[case(3_000.0, 15.0)]
    #[case(5_000.0, 0.0)]
    #[case(10_000.0, -30.0)]
    fn pitch_band(#[case] altitude: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(band_pitch(altitude, 5_000.0, 1_000.0, 30.0), expected, epsilon = 1e-9);
    }

    #[test]
    fn no_candidates_ends_phase() {
        let mut ctl = CruiseController::new(CruiseConfig::default());
        let g = tick(&mut ctl, &snap(vec![], vec![]));
        assert_eq!(g.status, PhaseStatus::Done(PhaseOutcome::NoTargetAvailable));
        assert_eq!(ctl.finish(&PhaseOutcome::NoTargetAvailable), vec![Command::DisengageAutopilot]);
    }

    #[test]
    fn acquisition_engages_once() {
        let mut ctl = CruiseController::new(CruiseConfig::default());
        let s = snap(vec![wp(1, "far", 50_000.0, WaypointKind::Thermometer)], vec![]);
        let g = tick(&mut ctl, &s);
        assert_eq!(g.commands[0], Command::EngageAutopilot);
        assert!(matches!(g.commands[1], Command::Tune(_)));
        let sp = g.setpoint.unwrap();
        assert_eq!(sp.throttle, 1.0);
        assert_abs_diff_eq!(sp.target_heading().unwrap(), 90.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sp.target_pitch().unwrap(), 15.0, epsilon = 1e-9);

        let g = tick(&mut ctl, &s);
        assert!(g.commands.is_empty());
    }

    #[test]
    fn arrival_resets_runs_and_clears() {
        let mut ctl = CruiseController::new(CruiseConfig::default());
        let s = snap(vec![wp(1, "site", 800.0, WaypointKind::Thermometer)], vec![thermometer(true)]);
        let g = tick(&mut ctl, &s);
        assert!(g.commands.ends_with(&[Command::ResetExperiment(ExperimentId(3)), Command::RunExperiment(ExperimentId(3))]));
        assert!(g.events.iter().any(|e| matches!(&e.kind, EventKind::TargetCleared { name } if name == "site")));
        assert!(ctl.target().is_none());

        // The cleared waypoint is not picked again.
        let g = tick(&mut ctl, &s);
        assert_eq!(g.status, PhaseStatus::Done(PhaseOutcome::NoTargetAvailable));
    }

    #[test]
    fn unserved_kind_is_skipped() {
        let mut ctl = CruiseController::new(CruiseConfig::default());
        let s = snap(
            vec![wp(1, "odd", 500.0, WaypointKind::Other("antenna".into())), wp(2, "next", 20_000.0, WaypointKind::Report)],
            vec![thermometer(false)],
        );
        let g = tick(&mut ctl, &s);
        assert!(!g.commands.iter().any(|c| matches!(c, Command::RunExperiment(_))));
        assert!(ctl.target().is_none());

        let g = tick(&mut ctl, &s);
        assert!(g.events.iter().any(|e| matches!(&e.kind, EventKind::TargetAcquired { name, .. } if name == "next")));
    }
}
