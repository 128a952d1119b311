pub mod records;
pub mod snapshot;

pub use records::{
    Experiment, ExperimentId, FuelState, ManeuverNode, ScienceSubject, Waypoint, WaypointId,
    WaypointKind,
};
pub use snapshot::{GeoPoint, Scope, Situation, Snapshot, G0};
