use std::time::Duration;

use super::command::{Command, Guidance, Tick};
use crate::sim::event::PhaseOutcome;
use crate::telemetry::{Scope, Snapshot};
use crate::vehicle::StagingTrigger;

/// Trait for flight-phase controllers.
///
/// Implement this to plug a guidance law into the polling loop. Controllers
/// never talk to the vessel directly: they read one snapshot per tick and
/// return a setpoint plus discrete commands.
pub trait Controller {
    /// Produce this tick's setpoint, commands and phase status.
    fn control(&mut self, tick: &Tick<'_>) -> Guidance;

    /// Commands issued once, before the first tick.
    fn start(&mut self, _snapshot: &Snapshot) -> Vec<Command> {
        vec![]
    }

    /// Commands issued once, after the phase reported `Done`.
    fn finish(&mut self, _outcome: &PhaseOutcome) -> Vec<Command> {
        vec![]
    }

    /// Extra telemetry this controller needs in each snapshot.
    fn scope(&self) -> Scope {
        Scope::BASIC
    }

    /// Minimum delay between ticks.
    fn interval(&self) -> Duration {
        Duration::from_millis(100)
    }

    /// What lets the fuel supervisor stage automatically during this phase.
    fn staging(&self) -> StagingTrigger {
        StagingTrigger::FuelDepleted
    }

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Tick interval from a configured number of seconds.
pub(crate) fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::from_millis(100))
}
