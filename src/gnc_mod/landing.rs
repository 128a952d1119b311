use std::f64::consts::PI;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use super::command::{Attitude, AutopilotTuning, Command, Guidance, PhaseStatus, Setpoint, Tick};
use super::controller::{seconds, Controller};
use super::waypoint::ApproachRoute;
use crate::nav::{bearing, clip, distance};
use crate::sim::event::{EventKind, FlightEvent, PhaseOutcome};
use crate::telemetry::{GeoPoint, Snapshot};
use crate::vehicle::StagingTrigger;

/// Lowest glide-slope target altitude, m.
pub const MIN_GLIDE_ALTITUDE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Landing configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    /// Cruise altitude ceiling before the approach, m.
    pub max_height: f64,
    pub max_pitch_angle: f64,
    /// Speed ceiling close to the stop point, m/s.
    pub land_horizontal_velocity: f64,
    /// Speed ceiling far from the stop point, m/s.
    pub max_horizontal_velocity: f64,
    pub max_horizontal_acceleration: f64,
    /// Distance to the stop point below which the landing ceiling applies, m.
    pub full_speed_until_distance_from_stop: f64,
    pub throttle_up_step: f64,
    pub throttle_down_step: f64,
    /// Brakes engage above this multiple of the speed ceiling.
    pub brake_ratio: f64,
    /// Glide slope: target altitude = (distance_to_stop - offset) / ratio.
    pub glide_offset: f64,
    pub glide_ratio: f64,
    /// Target altitude at or below which the flare is committed, m.
    pub flare_altitude: f64,
    pub flare_pitch: f64,
    /// Runway heading held during the flare, deg.
    pub final_heading: f64,
    pub landed_speed: f64,
    pub landed_altitude: f64,
    /// Landed condition must still hold after this many seconds.
    pub landing_grace: f64,
    pub interval: f64,
    /// Approach points, flown last to first.
    pub approach: Vec<GeoPoint>,
    pub stop: GeoPoint,
    pub tuning: AutopilotTuning,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            max_height: 2_000.0,
            max_pitch_angle: 30.0,
            land_horizontal_velocity: 50.0,
            max_horizontal_velocity: 200.0,
            max_horizontal_acceleration: 5.0,
            full_speed_until_distance_from_stop: 8_000.0,
            throttle_up_step: 0.05,
            throttle_down_step: 0.1,
            brake_ratio: 1.1,
            glide_offset: 1_800.0,
            glide_ratio: 10.0,
            flare_altitude: 20.0,
            flare_pitch: 1.0,
            final_heading: 270.0,
            landed_speed: 1.0,
            landed_altitude: 100.0,
            landing_grace: 1.0,
            interval: 0.1,
            // Runway approach from the east, recorded on a previous takeoff.
            approach: vec![
                GeoPoint::new(-0.048_908_199_758_066_09, -74.617_155_943_921_83),
                GeoPoint::new(-0.049_032_540_639_858_47, -74.522_029_455_861_12),
                GeoPoint::new(-0.048_887_443_493_621_71, -74.426_287_426_293_7),
                GeoPoint::new(-0.048_231_036_864_237_49, -74.235_203_771_271_76),
                GeoPoint::new(-0.047_372_404_830_724_7, -74.044_868_683_658_54),
                GeoPoint::new(-0.046_139_842_471_566, -73.756_896_234_845_16),
            ],
            stop: GeoPoint::new(-0.048_547_837_539_498_05, -74.713_405_628_682_04),
            tuning: AutopilotTuning {
                roll_threshold: 5.0,
                deceleration_time: [5.0, 5.0, 5.0],
                attenuation_angle: [0.1, 0.1, 0.1],
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Altitude hold law
// ---------------------------------------------------------------------------

/// Pitch (deg) that steers `altitude` towards `target_altitude` along a sine
/// S-curve: small relative errors give proportional commands, large ones
/// saturate at `max_pitch`.
pub fn altitude_hold_pitch(altitude: f64, target_altitude: f64, max_pitch: f64) -> f64 {
    let altitude = altitude.max(f64::EPSILON);
    let frac = if altitude >= target_altitude {
        1.0 - altitude / target_altitude
    } else {
        target_altitude / altitude - 1.0
    };
    let angle = 0.5 * clip(-PI, frac, PI);
    clip(-max_pitch, angle.sin() * max_pitch, max_pitch)
}

// ---------------------------------------------------------------------------
// Landing controller
// ---------------------------------------------------------------------------

/// Approach modes. `Flare` is terminal: once committed the vessel holds the
/// flare attitude with throttle closed and brakes on until it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingPhase {
    Approach,
    Flare,
}

#[derive(Debug, Clone)]
pub struct LandingController {
    pub config: LandingConfig,
    route: ApproachRoute,
    phase: LandingPhase,
    prev_vertical_speed: Option<f64>,
    prev_horizontal_speed: Option<f64>,
    landed_since: Option<f64>,
}

impl LandingController {
    pub fn new(config: LandingConfig) -> Self {
        let route = ApproachRoute::new(config.approach.clone(), config.stop);
        Self {
            config,
            route,
            phase: LandingPhase::Approach,
            prev_vertical_speed: None,
            prev_horizontal_speed: None,
            landed_since: None,
        }
    }

    pub fn phase(&self) -> LandingPhase {
        self.phase
    }

    pub fn route(&self) -> &ApproachRoute {
        &self.route
    }

    /// Backward finite difference; zero on the first tick.
    fn accelerations(&mut self, snap: &Snapshot, dt: f64) -> (f64, f64) {
        let dt = dt.max(1e-3);
        let vertical = self.prev_vertical_speed.map_or(0.0, |v| (snap.vertical_speed - v) / dt);
        let horizontal = self.prev_horizontal_speed.map_or(0.0, |v| (snap.horizontal_speed - v) / dt);
        self.prev_vertical_speed = Some(snap.vertical_speed);
        self.prev_horizontal_speed = Some(snap.horizontal_speed);
        (vertical, horizontal)
    }

    /// Target altitude on the glide slope for the remaining distance.
    pub fn target_altitude(&self, distance_to_stop: f64) -> f64 {
        let cfg = &self.config;
        clip(MIN_GLIDE_ALTITUDE, (distance_to_stop - cfg.glide_offset) / cfg.glide_ratio, cfg.max_height)
    }

    fn landed(&mut self, snap: &Snapshot) -> bool {
        let cfg = &self.config;
        if snap.horizontal_speed >= cfg.landed_speed || snap.surface_altitude >= cfg.landed_altitude {
            self.landed_since = None;
            return false;
        }
        let since = *self.landed_since.get_or_insert(snap.ut);
        snap.ut - since >= cfg.landing_grace
    }
}

impl Controller for LandingController {
    fn control(&mut self, tick: &Tick<'_>) -> Guidance {
        let snap = tick.snapshot;
        let mut events = vec![];

        let (vertical_accel, horizontal_accel) = self.accelerations(snap, tick.dt);
        let target = self.route.target();
        let distance_to_stop = distance(snap.position, self.route.stop());

        let cfg = &self.config;
        let ceiling = if distance_to_stop < cfg.full_speed_until_distance_from_stop {
            cfg.land_horizontal_velocity
        } else {
            cfg.max_horizontal_velocity
        };
        let velocity_fraction = snap.horizontal_speed / ceiling;
        let accel_fraction = horizontal_accel / cfg.max_horizontal_acceleration;

        // Bang-bang throttle: slow to add speed, quick to shed it.
        let mut throttle = snap.throttle;
        let mut brakes = false;
        if velocity_fraction < 1.0 {
            if accel_fraction < 1.0 {
                throttle += cfg.throttle_up_step;
            }
        } else {
            if accel_fraction > -1.0 {
                throttle -= cfg.throttle_down_step;
            }
            if velocity_fraction > cfg.brake_ratio {
                brakes = true;
            }
        }

        let target_altitude = self.target_altitude(distance_to_stop);
        if self.phase == LandingPhase::Approach && target_altitude <= self.config.flare_altitude {
            info!("Committing to touchdown {distance_to_stop:.0} m before the stop point");
            self.phase = LandingPhase::Flare;
            events.push(FlightEvent::new(snap.ut, EventKind::TouchDownCommitted));
        }

        let landed = self.landed(snap);
        let touching = self.landed_since.is_some();
        let cfg = &self.config;

        let mut setpoint = match self.phase {
            LandingPhase::Flare => Setpoint {
                attitude: Attitude::PitchHeading {
                    pitch: cfg.flare_pitch,
                    heading: cfg.final_heading,
                    roll: 0.0,
                },
                throttle: 0.0,
                brakes: true,
            },
            LandingPhase::Approach => {
                let pitch = altitude_hold_pitch(snap.surface_altitude, target_altitude, cfg.max_pitch_angle);
                log::debug!(
                    "Target pitch: {pitch:.1}, target height: {target_altitude:.1}, \
                     vertical accel {vertical_accel:.2}, distance to stop {distance_to_stop:.1}"
                );
                Setpoint {
                    attitude: Attitude::PitchHeading {
                        pitch,
                        heading: bearing(snap.position, target),
                        roll: 0.0,
                    },
                    throttle,
                    brakes,
                }
            }
        };

        // Stopped on the ground: close the throttle and hold the brakes
        // through the grace window and past the end of the phase.
        if touching {
            setpoint.throttle = 0.0;
            setpoint.brakes = true;
        }

        let max_horizontal_velocity = cfg.max_horizontal_velocity;
        if self.route.update(snap.position, max_horizontal_velocity) {
            events.push(FlightEvent::new(
                snap.ut,
                EventKind::WaypointReached { remaining: self.route.remaining() },
            ));
        }

        let mut g = Guidance::running(setpoint);
        if landed {
            info!("Aircraft landed");
            g.status = PhaseStatus::Done(PhaseOutcome::Completed);
        }
        g.events = events;
        g
    }

    fn start(&mut self, _snapshot: &Snapshot) -> Vec<Command> {
        vec![Command::EngageAutopilot, Command::Tune(self.config.tuning)]
    }

    fn finish(&mut self, _outcome: &PhaseOutcome) -> Vec<Command> {
        let restored = AutopilotTuning { attenuation_angle: [1.0, 1.0, 1.0], ..self.config.tuning };
        vec![Command::DisengageAutopilot, Command::Tune(restored)]
    }

    fn interval(&self) -> Duration {
        seconds(self.config.interval)
    }

    fn staging(&self) -> StagingTrigger {
        StagingTrigger::Off
    }

    fn name(&self) -> &str {
        "LandingController"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::KERBIN_RADIUS;
    use approx::assert_abs_diff_eq;

    /// Point on the equator `meters` east of the origin.
    fn east_of_origin(meters: f64) -> GeoPoint {
        GeoPoint::new(0.0, (meters / KERBIN_RADIUS).to_degrees())
    }

    fn controller_with_stop_at(meters: f64) -> LandingController {
        LandingController::new(LandingConfig {
            approach: vec![],
            stop: east_of_origin(meters),
            ..LandingConfig::default()
        })
    }

    fn flying(horizontal_speed: f64, surface_altitude: f64, throttle: f64) -> Snapshot {
        Snapshot {
            ut: 100.0,
            position: GeoPoint::new(0.0, 0.0),
            horizontal_speed,
            surface_altitude,
            throttle,
            ..Snapshot::default()
        }
    }

    #[test]
    fn s_curve_is_signed_and_saturates() {
        assert_abs_diff_eq!(altitude_hold_pitch(1_000.0, 1_000.0, 30.0), 0.0, epsilon = 1e-12);
        assert!(altitude_hold_pitch(500.0, 1_000.0, 30.0) > 0.0);
        assert!(altitude_hold_pitch(1_500.0, 1_000.0, 30.0) < 0.0);
        // target/alt - 1 = 9 > pi: saturated climb.
        assert_abs_diff_eq!(altitude_hold_pitch(100.0, 1_000.0, 30.0), 30.0, epsilon = 1e-12);
        // On the ground the command is still finite.
        assert_abs_diff_eq!(altitude_hold_pitch(0.0, 1_000.0, 30.0), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn glide_slope_is_clamped() {
        let c = controller_with_stop_at(10_000.0);
        assert_abs_diff_eq!(c.target_altitude(10_000.0), 820.0, epsilon = 1e-9);
        assert_eq!(c.target_altitude(500.0), 0.01);
        assert_eq!(c.target_altitude(100_000.0), 2_000.0);
    }

    #[test]
    fn far_and_slow_adds_throttle() {
        let mut c = controller_with_stop_at(10_000.0);
        let s = flying(150.0, 800.0, 0.5);
        let g = c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 });
        let sp = g.setpoint.unwrap();
        assert_abs_diff_eq!(sp.throttle, 0.55, epsilon = 1e-12);
        assert!(!sp.brakes);
        assert_eq!(c.phase(), LandingPhase::Approach);
        // Heading towards the stop point, due east.
        assert_abs_diff_eq!(sp.target_heading().unwrap(), 90.0, epsilon = 1e-6);
    }

    #[test]
    fn close_and_fast_brakes_and_cuts_throttle() {
        let mut c = controller_with_stop_at(500.0);
        let s = flying(60.0, 30.0, 0.5);
        let sp = c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 }).setpoint.unwrap();
        assert!(sp.brakes);
        assert!(sp.throttle < 0.5);
    }

    #[test]
    fn over_ceiling_without_flare_uses_down_step() {
        // 7000 m out: landing ceiling applies, glide slope still at 520 m.
        let mut c = controller_with_stop_at(7_000.0);
        let s = flying(60.0, 520.0, 0.5);
        let sp = c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 }).setpoint.unwrap();
        assert_abs_diff_eq!(sp.throttle, 0.4, epsilon = 1e-12);
        assert!(sp.brakes);
        assert_eq!(c.phase(), LandingPhase::Approach);
    }

    #[test]
    fn strong_acceleration_holds_throttle() {
        let mut c = controller_with_stop_at(10_000.0);
        let s = flying(100.0, 800.0, 0.5);
        c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 });
        // +1 m/s in 0.1 s = 10 m/s^2, twice the limit.
        let s = flying(101.0, 800.0, 0.5);
        let sp = c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 }).setpoint.unwrap();
        assert_abs_diff_eq!(sp.throttle, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn flare_is_irreversible() {
        let mut c = controller_with_stop_at(1_000.0);
        let s = flying(40.0, 10.0, 0.3);
        let g = c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 });
        assert_eq!(c.phase(), LandingPhase::Flare);
        assert!(g.events.iter().any(|e| e.kind == EventKind::TouchDownCommitted));

        // Even with a glide slope far above the flare altitude again.
        let mut far = flying(40.0, 500.0, 0.3);
        far.position = east_of_origin(-50_000.0);
        let sp = c.control(&Tick { snapshot: &far, dt: 0.1, fuel: 0.0 }).setpoint.unwrap();
        assert_eq!(c.phase(), LandingPhase::Flare);
        assert_eq!(sp.throttle, 0.0);
        assert!(sp.brakes);
        assert_eq!(sp.target_pitch(), Some(1.0));
        assert_eq!(sp.target_heading(), Some(270.0));
    }

    #[test]
    fn landing_needs_grace_period() {
        let mut c = controller_with_stop_at(100.0);
        let mut s = flying(0.5, 5.0, 0.0);
        assert!(!c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 }).is_done());

        // Transient: speed picks up again, timer resets.
        s.ut += 0.5;
        s.horizontal_speed = 3.0;
        assert!(!c.control(&Tick { snapshot: &s, dt: 0.5, fuel: 0.0 }).is_done());

        s.horizontal_speed = 0.2;
        s.ut += 0.5;
        assert!(!c.control(&Tick { snapshot: &s, dt: 0.5, fuel: 0.0 }).is_done());
        s.ut += 1.0;
        assert!(c.control(&Tick { snapshot: &s, dt: 1.0, fuel: 0.0 }).is_done());
    }

    #[test]
    fn stopped_short_of_the_stop_point_holds_throttle_closed() {
        let mut c = controller_with_stop_at(10_000.0);
        let mut s = flying(0.0, 5.0, 0.5);
        for _ in 0..6 {
            let g = c.control(&Tick { snapshot: &s, dt: 0.2, fuel: 0.0 });
            let sp = g.setpoint.unwrap();
            assert_eq!(sp.throttle, 0.0);
            assert!(sp.brakes);
            s.ut += 0.2;
        }
        assert_eq!(c.phase(), LandingPhase::Approach);
    }

    #[test]
    fn route_advances_while_approaching() {
        let mut c = LandingController::new(LandingConfig {
            approach: vec![east_of_origin(20_000.0), GeoPoint::new(0.0, 0.0)],
            stop: east_of_origin(30_000.0),
            ..LandingConfig::default()
        });
        let s = flying(150.0, 1_500.0, 0.5);
        let g = c.control(&Tick { snapshot: &s, dt: 0.1, fuel: 0.0 });
        assert_eq!(c.route().cursor(), Some(0));
        assert!(g.events.iter().any(|e| matches!(e.kind, EventKind::WaypointReached { remaining: 1 })));
    }
}
