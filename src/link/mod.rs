//! Seams between the guidance core and the simulation host.
//!
//! The transport itself (session handshake, streams) lives outside this
//! crate; anything that implements [`TelemetrySource`] and [`ActuationSink`]
//! can be flown.

pub mod clock;
pub mod loopback;

use nalgebra::Vector3;

use crate::errors::LinkError;
use crate::gnc::{Attitude, AutopilotTuning, Command, Setpoint};
use crate::telemetry::{ExperimentId, Scope, Snapshot};

pub use clock::{Clock, NoopClock, WallClock};
pub use loopback::{Actuators, Loopback};

/// On-demand readings from the simulated vessel.
pub trait TelemetrySource {
    /// Sample every reading once. Fields outside `scope` may be left empty.
    fn snapshot(&mut self, scope: Scope) -> Result<Snapshot, LinkError>;
}

/// Commands applied instantly in the simulated world, without buffering.
pub trait ActuationSink {
    /// Implementations clamp `throttle` into [0, 1].
    fn set_throttle(&mut self, throttle: f64) -> Result<(), LinkError>;
    fn set_target_pitch(&mut self, pitch: f64) -> Result<(), LinkError>;
    fn set_target_heading(&mut self, heading: f64) -> Result<(), LinkError>;
    fn set_target_roll(&mut self, roll: f64) -> Result<(), LinkError>;
    /// Target direction in the current maneuver node's reference frame.
    fn set_target_direction(&mut self, direction: Vector3<f64>) -> Result<(), LinkError>;
    fn set_brakes(&mut self, on: bool) -> Result<(), LinkError>;
    fn activate_next_stage(&mut self) -> Result<(), LinkError>;
    fn engage_autopilot(&mut self) -> Result<(), LinkError>;
    fn disengage_autopilot(&mut self) -> Result<(), LinkError>;
    fn configure_autopilot(&mut self, tuning: &AutopilotTuning) -> Result<(), LinkError>;
    fn set_stability_assist(&mut self, on: bool) -> Result<(), LinkError>;
    /// Warp to an absolute universal time, s.
    fn warp_to(&mut self, ut: f64) -> Result<(), LinkError>;
    fn remove_node(&mut self) -> Result<(), LinkError>;
    fn run_experiment(&mut self, id: ExperimentId) -> Result<(), LinkError>;
    fn reset_experiment(&mut self, id: ExperimentId) -> Result<(), LinkError>;
    fn transmit_experiment(&mut self, id: ExperimentId) -> Result<(), LinkError>;
}

/// A handle that both reports telemetry and accepts commands.
pub trait Vessel: TelemetrySource + ActuationSink {}

impl<T: TelemetrySource + ActuationSink + ?Sized> Vessel for T {}

/// Push a setpoint to the sink.
pub fn apply_setpoint<A: ActuationSink + ?Sized>(sink: &mut A, setpoint: &Setpoint) -> Result<(), LinkError> {
    match setpoint.attitude {
        Attitude::Hold => {}
        Attitude::PitchHeading { pitch, heading, roll } => {
            sink.set_target_pitch(pitch)?;
            sink.set_target_heading(heading)?;
            sink.set_target_roll(roll)?;
        }
        Attitude::NodeDirection(direction) => sink.set_target_direction(direction)?,
    }
    sink.set_throttle(setpoint.throttle)?;
    sink.set_brakes(setpoint.brakes)
}

/// Forward one discrete command to the sink.
pub fn dispatch<A: ActuationSink + ?Sized>(sink: &mut A, command: &Command) -> Result<(), LinkError> {
    match command {
        Command::EngageAutopilot => sink.engage_autopilot(),
        Command::DisengageAutopilot => sink.disengage_autopilot(),
        Command::Tune(tuning) => sink.configure_autopilot(tuning),
        Command::StabilityAssist(on) => sink.set_stability_assist(*on),
        Command::WarpTo(ut) => sink.warp_to(*ut),
        Command::RemoveNode => sink.remove_node(),
        Command::ActivateNextStage => sink.activate_next_stage(),
        Command::RunExperiment(id) => sink.run_experiment(*id),
        Command::ResetExperiment(id) => sink.reset_experiment(*id),
        Command::TransmitExperiment(id) => sink.transmit_experiment(*id),
    }
}
