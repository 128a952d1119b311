pub mod errors;
pub mod nav;
pub mod telemetry;
pub mod link;
pub mod vehicle;
mod gnc_mod;
pub mod sim;
pub mod io;
pub mod orbital;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}

pub use errors::{FlightError, LinkError};
pub use sim::{run_phase, PhaseOutcome, PhaseReport, RunLimits};
