use nalgebra::Vector3;

use super::snapshot::GeoPoint;

// ---------------------------------------------------------------------------
// Fuel in the next decouple stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FuelState {
    pub solid: f64,
    pub liquid: f64,
}

impl FuelState {
    pub fn new(solid: f64, liquid: f64) -> Self {
        Self { solid, liquid }
    }

    pub fn remaining(&self) -> f64 {
        self.solid.max(self.liquid)
    }

    /// Both propellants below `epsilon`.
    pub fn is_depleted(&self, epsilon: f64) -> bool {
        self.solid < epsilon && self.liquid < epsilon
    }
}

// ---------------------------------------------------------------------------
// Ground waypoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WaypointKind {
    Report,
    Thermometer,
    Barometer,
    Seismic,
    Gravity,
    Other(String),
}

impl WaypointKind {
    /// Parse the simulator's icon name.
    pub fn from_icon(icon: &str) -> Self {
        match icon {
            "report" => WaypointKind::Report,
            "thermometer" => WaypointKind::Thermometer,
            "barometer" => WaypointKind::Barometer,
            "seismic" => WaypointKind::Seismic,
            "gravity" => WaypointKind::Gravity,
            other => WaypointKind::Other(other.to_string()),
        }
    }

    pub fn icon(&self) -> &str {
        match self {
            WaypointKind::Report => "report",
            WaypointKind::Thermometer => "thermometer",
            WaypointKind::Barometer => "barometer",
            WaypointKind::Seismic => "seismic",
            WaypointKind::Gravity => "gravity",
            WaypointKind::Other(icon) => icon,
        }
    }
}

/// Host handle of a waypoint. Display names are not unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaypointId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub id: WaypointId,
    pub name: String,
    pub position: GeoPoint,
    pub has_contract: bool,
    pub near_surface: bool,
    /// Bedrock altitude of the waypoint, m.
    pub altitude_ceiling: f64,
    pub kind: WaypointKind,
}

// ---------------------------------------------------------------------------
// Science experiments
// ---------------------------------------------------------------------------

/// Handle of an experiment part on the vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExperimentId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScienceSubject {
    /// Fraction of the cap still obtainable, [0, 1].
    pub scientific_value: f64,
    pub science_cap: f64,
}

impl ScienceSubject {
    pub fn obtainable(&self) -> f64 {
        self.scientific_value * self.science_cap
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub id: ExperimentId,
    pub part_name: String,
    pub available: bool,
    pub inoperable: bool,
    pub has_data: bool,
    pub rerunnable: bool,
    /// Science value of the data currently stored, 0 without data.
    pub stored_science: f64,
    pub subject: Option<ScienceSubject>,
}

// ---------------------------------------------------------------------------
// Maneuver node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverNode {
    pub delta_v: f64,           // m/s, planned
    pub remaining_delta_v: f64, // m/s, still to burn
    pub time_to: f64,           // s until the node
    /// Vessel facing expressed in the node's reference frame; prograde is +Y.
    pub facing: Vector3<f64>,
}
