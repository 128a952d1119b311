use serde::{Deserialize, Serialize};

use super::records::{Experiment, FuelState, ManeuverNode, Waypoint};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Standard gravity used by the simulator's rocket equation, m/s^2.
pub const G0: f64 = 9.82;

// ---------------------------------------------------------------------------
// Surface position
// ---------------------------------------------------------------------------

/// Latitude/longitude on the body's surface, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Coarse vessel situation as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Situation {
    #[default]
    PreLaunch,
    Landed,
    Splashed,
    Flying,
    SubOrbital,
    Orbiting,
    Escaping,
    Docked,
}

impl Situation {
    /// Resting on ground or water.
    pub fn is_down(self) -> bool {
        matches!(self, Situation::Landed | Situation::Splashed)
    }
}

// ---------------------------------------------------------------------------
// What a snapshot must carry beyond the basic flight readings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scope {
    pub waypoints: bool,
    pub experiments: bool,
    pub node: bool,
}

impl Scope {
    pub const BASIC: Scope = Scope { waypoints: false, experiments: false, node: false };
}

// ---------------------------------------------------------------------------
// Per-tick snapshot
// ---------------------------------------------------------------------------

/// Everything a controller may read during one tick, sampled once.
///
/// Angles are degrees, altitudes m, speeds m/s, thrust N, mass kg.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub ut: f64,                        // universal time, s
    pub position: GeoPoint,
    pub surface_altitude: f64,          // above terrain or sea
    pub mean_altitude: f64,             // above mean sea level
    pub bedrock_altitude: f64,          // above bedrock
    pub vertical_speed: f64,
    pub horizontal_speed: f64,
    pub surface_speed: f64,
    pub pitch: f64,
    pub heading: f64,
    pub roll: f64,
    pub g_force: f64,
    pub stage: i32,                     // current stage index, counts down
    pub throttle: f64,                  // read back from the vessel, [0, 1]
    pub thrust: f64,
    pub available_thrust: f64,
    pub specific_impulse: f64,          // s
    pub mass: f64,
    pub apoapsis_altitude: f64,
    pub situation: Situation,
    /// Fuel in the stage that will be jettisoned next (`stage - 1`).
    /// `None` when the simulator has no such decouple stage.
    pub decouple_fuel: Option<FuelState>,
    pub waypoints: Vec<Waypoint>,
    pub experiments: Vec<Experiment>,
    pub node: Option<ManeuverNode>,
}
