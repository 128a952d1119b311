pub mod maneuvers;

pub use maneuvers::BurnPlan;
