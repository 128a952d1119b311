use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use super::command::{Attitude, AutopilotTuning, Command, Guidance, PhaseStatus, Setpoint, Tick};
use super::controller::{seconds, Controller};
use super::cruise::band_pitch;
use crate::nav::distance;
use crate::sim::event::{EventKind, FlightEvent, PhaseOutcome};
use crate::telemetry::{GeoPoint, Snapshot};
use crate::vehicle::StagingTrigger;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeoffConfig {
    pub target_height: f64,
    pub min_height: f64,
    pub max_pitch_angle: f64,
    pub heading: f64,
    /// Surface speed at which rotation starts, m/s.
    pub lift_off_velocity: f64,
    /// Below this surface altitude the aircraft counts as rolling, m.
    pub ground_altitude: f64,
    /// Great-circle spacing of recorded approach points, m.
    pub snapshot_distance_interval: f64,
    pub total_snapshots: usize,
    pub tuning: AutopilotTuning,
    pub interval: f64,
}

impl Default for TakeoffConfig {
    fn default() -> Self {
        Self {
            target_height: 5_000.0,
            min_height: 1_000.0,
            max_pitch_angle: 30.0,
            heading: 90.0,
            lift_off_velocity: 50.0,
            ground_altitude: 100.0,
            snapshot_distance_interval: 1_000.0,
            total_snapshots: 10,
            tuning: AutopilotTuning {
                roll_threshold: 180.0,
                deceleration_time: [30.0, 30.0, 30.0],
                attenuation_angle: [0.1, 0.1, 0.1],
            },
            interval: 0.1,
        }
    }
}

/// Runway takeoff and climb-out that records the ground track as it goes.
///
/// The recorded points are spaced along the departure path, so flying them
/// last to first brings the aircraft back onto the same runway.
#[derive(Debug, Clone)]
pub struct TakeoffController {
    pub config: TakeoffConfig,
    start: Option<GeoPoint>,
    route: Vec<GeoPoint>,
    airborne: bool,
}

impl TakeoffController {
    pub fn new(config: TakeoffConfig) -> Self {
        Self { config, start: None, route: vec![], airborne: false }
    }

    /// Approach points recorded so far, in departure order.
    pub fn recorded_route(&self) -> &[GeoPoint] {
        &self.route
    }

    pub fn start_point(&self) -> Option<GeoPoint> {
        self.start
    }

    fn rolling(&self, snap: &Snapshot) -> bool {
        snap.surface_speed < self.config.lift_off_velocity && snap.surface_altitude < self.config.ground_altitude
    }

    fn record(&mut self, snap: &Snapshot) -> Option<FlightEvent> {
        let cfg = &self.config;
        let start = *self.start.get_or_insert(snap.position);
        if self.route.len() >= cfg.total_snapshots {
            return None;
        }
        let next_at = cfg.snapshot_distance_interval * (self.route.len() + 1) as f64;
        if distance(start, snap.position) < next_at {
            return None;
        }
        self.route.push(snap.position);
        let index = self.route.len() - 1;
        info!("Recorded approach point {index}: {:?}", snap.position);
        Some(FlightEvent::new(snap.ut, EventKind::ApproachPointRecorded { index, point: snap.position }))
    }
}

impl Controller for TakeoffController {
    fn control(&mut self, tick: &Tick<'_>) -> Guidance {
        let snap = tick.snapshot;
        let mut events = vec![];

        let rolling = self.rolling(snap);
        if !rolling && !self.airborne {
            info!("Rotating at {:.1} m/s", snap.surface_speed);
            self.airborne = true;
            events.push(FlightEvent::new(snap.ut, EventKind::LiftOff));
        }

        let cfg = &self.config;
        let pitch = if rolling {
            snap.pitch
        } else {
            band_pitch(snap.surface_altitude, cfg.target_height, cfg.min_height, cfg.max_pitch_angle)
        };
        let setpoint = Setpoint {
            attitude: Attitude::PitchHeading { pitch, heading: cfg.heading, roll: 0.0 },
            throttle: 1.0,
            brakes: false,
        };

        if !rolling {
            events.extend(self.record(snap));
        }

        let mut g = Guidance::running(setpoint);
        if self.route.len() >= self.config.total_snapshots && snap.surface_altitude >= self.config.min_height {
            info!("Takeoff complete, {} approach points recorded", self.route.len());
            g.status = PhaseStatus::Done(PhaseOutcome::Completed);
        }
        g.events = events;
        g
    }

    fn start(&mut self, snapshot: &Snapshot) -> Vec<Command> {
        self.start = Some(snapshot.position);
        vec![Command::EngageAutopilot, Command::Tune(self.config.tuning)]
    }

    fn finish(&mut self, _outcome: &PhaseOutcome) -> Vec<Command> {
        vec![Command::DisengageAutopilot]
    }

    fn interval(&self) -> Duration {
        seconds(self.config.interval)
    }

    fn staging(&self) -> StagingTrigger {
        StagingTrigger::ThrustLost
    }

    fn name(&self) -> &str {
        "TakeoffController"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::KERBIN_RADIUS;
    use approx::assert_abs_diff_eq;

    fn east(meters: f64) -> GeoPoint {
        GeoPoint::new(0.0, (meters / KERBIN_RADIUS).to_degrees())
    }

    fn snap(meters: f64, speed: f64, altitude: f64) -> Snapshot {
        Snapshot {
            position: east(meters),
            surface_speed: speed,
            surface_altitude: altitude,
            pitch: 4.0,
            ..Snapshot::default()
        }
    }

    fn tick(ctl: &mut TakeoffController, s: &Snapshot) -> Guidance {
        ctl.control(&Tick { snapshot: s, dt: 0.1, fuel: 0.0 })
    }

    #[test]
    fn holds_pitch_while_rolling() {
        let mut ctl = TakeoffController::new(TakeoffConfig::default());
        ctl.start(&snap(0.0, 0.0, 70.0));
        let g = tick(&mut ctl, &snap(10.0, 20.0, 70.0));
        let sp = g.setpoint.unwrap();
        assert_abs_diff_eq!(sp.target_pitch().unwrap(), 4.0, epsilon = 1e-12);
        assert_eq!(sp.throttle, 1.0);
        assert!(!sp.brakes);
        assert!(g.events.is_empty());
    }

    #[test]
    fn rotates_at_lift_off_speed() {
        let mut ctl = TakeoffController::new(TakeoffConfig::default());
        ctl.start(&snap(0.0, 0.0, 70.0));
        let g = tick(&mut ctl, &snap(600.0, 55.0, 70.0));
        assert!(g.events.iter().any(|e| e.kind == EventKind::LiftOff));
        assert_abs_diff_eq!(g.setpoint.unwrap().target_pitch().unwrap(), 30.0, epsilon = 1e-12);
        // Lift-off is reported once.
        let g = tick(&mut ctl, &snap(700.0, 60.0, 90.0));
        assert!(!g.events.iter().any(|e| e.kind == EventKind::LiftOff));
    }

    #[test]
    fn records_points_at_fixed_spacing() {
        let mut ctl = TakeoffController::new(TakeoffConfig { total_snapshots: 3, ..TakeoffConfig::default() });
        ctl.start(&snap(0.0, 0.0, 70.0));
        tick(&mut ctl, &snap(900.0, 80.0, 200.0));
        assert!(ctl.recorded_route().is_empty());
        tick(&mut ctl, &snap(1_050.0, 80.0, 300.0));
        tick(&mut ctl, &snap(1_500.0, 80.0, 400.0));
        tick(&mut ctl, &snap(2_100.0, 80.0, 500.0));
        assert_eq!(ctl.recorded_route().len(), 2);
        assert_eq!(ctl.recorded_route()[0], east(1_050.0));
    }

    #[test]
    fn ground_roll_is_not_recorded() {
        let mut ctl = TakeoffController::new(TakeoffConfig::default());
        ctl.start(&snap(0.0, 0.0, 70.0));
        // A long slow roll past the first spacing mark.
        tick(&mut ctl, &snap(1_200.0, 40.0, 70.0));
        assert!(ctl.recorded_route().is_empty());
        tick(&mut ctl, &snap(1_300.0, 55.0, 80.0));
        assert_eq!(ctl.recorded_route(), [east(1_300.0)]);
    }

    #[test]
    fn done_once_route_recorded_and_high_enough() {
        let mut ctl = TakeoffController::new(TakeoffConfig { total_snapshots: 2, ..TakeoffConfig::default() });
        ctl.start(&snap(0.0, 0.0, 70.0));
        assert!(!tick(&mut ctl, &snap(1_100.0, 100.0, 600.0)).is_done());
        // Route complete but still below min_height.
        assert!(!tick(&mut ctl, &snap(2_100.0, 100.0, 900.0)).is_done());
        assert_eq!(ctl.recorded_route().len(), 2);
        assert!(tick(&mut ctl, &snap(3_100.0, 100.0, 1_000.0)).is_done());
    }

    #[test]
    fn stages_on_flame_out() {
        let ctl = TakeoffController::new(TakeoffConfig::default());
        assert_eq!(ctl.staging(), StagingTrigger::ThrustLost);
    }
}
