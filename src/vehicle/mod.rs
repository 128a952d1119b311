pub mod staging;

pub use staging::{FuelSupervisor, MissingStagePolicy, StagingConfig, StagingTrigger};
