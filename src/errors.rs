use snafu::Snafu;

use crate::io::config::ConfigError;

/// Failures of the telemetry/actuation transport.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LinkError {
    #[snafu(display("telemetry read failed: {what}"))]
    Telemetry { what: String },
    #[snafu(display("actuation command rejected: {what}"))]
    Actuation { what: String },
    #[snafu(display("link to the simulation host is closed"))]
    Disconnected,
}

/// Errors that end a phase run without a flight outcome.
///
/// Flight-level failures (misalignment, divergence, no target) are not errors,
/// they are reported as a `PhaseOutcome`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FlightError {
    #[snafu(display("vessel link failed: {source}"))]
    Link { source: LinkError },
    #[snafu(display("phase did not finish within {ticks} ticks"))]
    TickLimit { ticks: u64 },
    #[snafu(display("flight plan is unusable: {source}"))]
    Config { source: ConfigError },
}

impl From<LinkError> for FlightError {
    fn from(source: LinkError) -> Self {
        FlightError::Link { source }
    }
}

impl From<ConfigError> for FlightError {
    fn from(source: ConfigError) -> Self {
        FlightError::Config { source }
    }
}
