use crate::telemetry::GeoPoint;

// ---------------------------------------------------------------------------
// How a phase ended
// ---------------------------------------------------------------------------

/// Why a phase gave up. None of these are retried.
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    /// No maneuver node was planned.
    NoManeuverNode,
    /// Zero available thrust or specific impulse; no burn time can be planned.
    NoThrust,
    /// Burn start reached while not pointing along the burn direction.
    Misaligned { error: [f64; 3] },
    /// Remaining delta-v kept growing during the burn.
    Diverging { remaining_delta_v: f64 },
}

/// Terminal status of a phase run.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    Completed,
    /// The waypoint sequencer ran out of candidates.
    NoTargetAvailable,
    Aborted(AbortReason),
}

impl PhaseOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, PhaseOutcome::Aborted(_))
    }
}

// ---------------------------------------------------------------------------
// Notable moments during a phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Staged { from: i32 },
    GravityTurnStarted,
    ApoapsisHoldLatched,
    ApoapsisReached { apoapsis: f64 },
    WaypointReached { remaining: usize },
    TargetAcquired { name: String, distance: f64 },
    TargetCleared { name: String },
    TouchDownCommitted,
    LiftOff,
    ApproachPointRecorded { index: usize, point: GeoPoint },
    BurnStarted,
    BurnFineTuning,
    ExperimentRun { part: String, science: f64 },
}

/// A discrete event observed during a phase, stamped with universal time.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightEvent {
    pub ut: f64,
    pub kind: EventKind,
}

impl FlightEvent {
    pub fn new(ut: f64, kind: EventKind) -> Self {
        Self { ut, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborts_are_not_successes() {
        assert!(PhaseOutcome::Completed.is_success());
        assert!(PhaseOutcome::NoTargetAvailable.is_success());
        assert!(!PhaseOutcome::Aborted(AbortReason::NoManeuverNode).is_success());
    }
}
