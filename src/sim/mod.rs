pub mod event;
pub mod runner;

pub use event::{AbortReason, EventKind, FlightEvent, PhaseOutcome};
pub use runner::{run_phase, PhaseReport, RunLimits};
