pub mod config;
pub mod csv;

pub use config::{ConfigError, FlightPlan};
