pub mod burn;
pub mod command;
pub mod controller;
pub mod cruise;
pub mod guidance;
pub mod landing;
pub mod science;
pub mod takeoff;
pub mod waypoint;

pub use burn::{BurnConfig, BurnExecutor, BurnState};
pub use command::{Attitude, AutopilotTuning, Command, Guidance, PhaseStatus, Setpoint, Tick};
pub use controller::Controller;
pub use cruise::{CruiseConfig, CruiseController};
pub use guidance::{gravity_turn_pitch, AscentConfig, AscentGuidance, AscentPhase};
pub use landing::{LandingConfig, LandingController, LandingPhase, MIN_GLIDE_ALTITUDE};
pub use science::{ScienceConfig, ScienceRunner};
pub use takeoff::{TakeoffConfig, TakeoffController};
pub use waypoint::{ApproachRoute, ContractSelector};
