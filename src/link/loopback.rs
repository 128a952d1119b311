use std::collections::VecDeque;

use nalgebra::Vector3;

use super::{ActuationSink, TelemetrySource};
use crate::errors::LinkError;
use crate::gnc::{Attitude, AutopilotTuning, Command};
use crate::telemetry::{Experiment, ExperimentId, Scope, Snapshot};

// ---------------------------------------------------------------------------
// Actuator state as last written
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Actuators {
    pub throttle: f64,
    pub attitude: Attitude,
    pub brakes: bool,
    pub autopilot: bool,
    pub stability_assist: bool,
    pub tuning: AutopilotTuning,
}

impl Default for Actuators {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            attitude: Attitude::Hold,
            brakes: false,
            autopilot: false,
            stability_assist: false,
            tuning: AutopilotTuning::default(),
        }
    }
}

/// Advances the loopback state between two snapshot reads.
pub type Model = Box<dyn FnMut(&mut Snapshot, &Actuators, f64)>;

// ---------------------------------------------------------------------------
// In-memory vessel
// ---------------------------------------------------------------------------

/// An in-memory vessel for dry runs and tests.
///
/// Each `snapshot` read consumes the next scripted frame if one is queued,
/// then lets the optional model advance the state by `step` seconds. The
/// throttle reading always mirrors the last (clamped) throttle command.
/// Every discrete command is recorded in `commands`.
pub struct Loopback {
    pub state: Snapshot,
    pub actuators: Actuators,
    pub commands: Vec<Command>,
    /// Number of setpoint writes (throttle commands) received.
    pub setpoint_writes: usize,
    frames: VecDeque<Snapshot>,
    model: Option<Model>,
    step: f64,
}

impl Loopback {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            actuators: Actuators { throttle: initial.throttle, ..Actuators::default() },
            state: initial,
            commands: vec![],
            setpoint_writes: 0,
            frames: VecDeque::new(),
            model: None,
            step: 0.1,
        }
    }

    /// Queue frames that replace the state on successive reads.
    pub fn with_frames(mut self, frames: impl IntoIterator<Item = Snapshot>) -> Self {
        self.frames.extend(frames);
        self
    }

    /// Attach a model that advances the state by `step` seconds per read.
    pub fn with_model(mut self, step: f64, model: impl FnMut(&mut Snapshot, &Actuators, f64) + 'static) -> Self {
        self.step = step;
        self.model = Some(Box::new(model));
        self
    }

    pub fn count(&self, command: &Command) -> usize {
        self.commands.iter().filter(|c| *c == command).count()
    }

    fn experiment_mut(&mut self, id: ExperimentId) -> Result<&mut Experiment, LinkError> {
        self.state
            .experiments
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| LinkError::Actuation { what: format!("no experiment {}", id.0) })
    }
}

impl TelemetrySource for Loopback {
    fn snapshot(&mut self, scope: Scope) -> Result<Snapshot, LinkError> {
        if let Some(frame) = self.frames.pop_front() {
            self.state = frame;
        }
        if let Some(model) = self.model.as_mut() {
            model(&mut self.state, &self.actuators, self.step);
            self.state.ut += self.step;
        }
        self.state.throttle = self.actuators.throttle;

        let mut snap = self.state.clone();
        if !scope.waypoints {
            snap.waypoints.clear();
        }
        if !scope.experiments {
            snap.experiments.clear();
        }
        if !scope.node {
            snap.node = None;
        }
        Ok(snap)
    }
}

impl ActuationSink for Loopback {
    fn set_throttle(&mut self, throttle: f64) -> Result<(), LinkError> {
        self.actuators.throttle = throttle.clamp(0.0, 1.0);
        self.state.throttle = self.actuators.throttle;
        self.setpoint_writes += 1;
        Ok(())
    }

    fn set_target_pitch(&mut self, pitch: f64) -> Result<(), LinkError> {
        let (heading, roll) = match self.actuators.attitude {
            Attitude::PitchHeading { heading, roll, .. } => (heading, roll),
            _ => (self.state.heading, 0.0),
        };
        self.actuators.attitude = Attitude::PitchHeading { pitch, heading, roll };
        Ok(())
    }

    fn set_target_heading(&mut self, heading: f64) -> Result<(), LinkError> {
        let (pitch, roll) = match self.actuators.attitude {
            Attitude::PitchHeading { pitch, roll, .. } => (pitch, roll),
            _ => (self.state.pitch, 0.0),
        };
        self.actuators.attitude = Attitude::PitchHeading { pitch, heading, roll };
        Ok(())
    }

    fn set_target_roll(&mut self, roll: f64) -> Result<(), LinkError> {
        let (pitch, heading) = match self.actuators.attitude {
            Attitude::PitchHeading { pitch, heading, .. } => (pitch, heading),
            _ => (self.state.pitch, self.state.heading),
        };
        self.actuators.attitude = Attitude::PitchHeading { pitch, heading, roll };
        Ok(())
    }

    fn set_target_direction(&mut self, direction: Vector3<f64>) -> Result<(), LinkError> {
        self.actuators.attitude = Attitude::NodeDirection(direction);
        Ok(())
    }

    fn set_brakes(&mut self, on: bool) -> Result<(), LinkError> {
        self.actuators.brakes = on;
        Ok(())
    }

    fn activate_next_stage(&mut self) -> Result<(), LinkError> {
        self.commands.push(Command::ActivateNextStage);
        self.state.stage -= 1;
        Ok(())
    }

    fn engage_autopilot(&mut self) -> Result<(), LinkError> {
        self.commands.push(Command::EngageAutopilot);
        self.actuators.autopilot = true;
        Ok(())
    }

    fn disengage_autopilot(&mut self) -> Result<(), LinkError> {
        self.commands.push(Command::DisengageAutopilot);
        self.actuators.autopilot = false;
        Ok(())
    }

    fn configure_autopilot(&mut self, tuning: &AutopilotTuning) -> Result<(), LinkError> {
        self.commands.push(Command::Tune(*tuning));
        self.actuators.tuning = *tuning;
        Ok(())
    }

    fn set_stability_assist(&mut self, on: bool) -> Result<(), LinkError> {
        self.commands.push(Command::StabilityAssist(on));
        self.actuators.stability_assist = on;
        Ok(())
    }

    fn warp_to(&mut self, ut: f64) -> Result<(), LinkError> {
        self.commands.push(Command::WarpTo(ut));
        let skipped = (ut - self.state.ut).max(0.0);
        self.state.ut += skipped;
        if let Some(node) = self.state.node.as_mut() {
            node.time_to -= skipped;
        }
        Ok(())
    }

    fn remove_node(&mut self) -> Result<(), LinkError> {
        self.commands.push(Command::RemoveNode);
        self.state.node = None;
        Ok(())
    }

    fn run_experiment(&mut self, id: ExperimentId) -> Result<(), LinkError> {
        self.commands.push(Command::RunExperiment(id));
        let exp = self.experiment_mut(id)?;
        exp.has_data = true;
        exp.stored_science = exp.subject.map_or(0.0, |s| s.obtainable());
        Ok(())
    }

    fn reset_experiment(&mut self, id: ExperimentId) -> Result<(), LinkError> {
        self.commands.push(Command::ResetExperiment(id));
        let exp = self.experiment_mut(id)?;
        exp.has_data = false;
        exp.stored_science = 0.0;
        Ok(())
    }

    fn transmit_experiment(&mut self, id: ExperimentId) -> Result<(), LinkError> {
        self.commands.push(Command::TransmitExperiment(id));
        let exp = self.experiment_mut(id)?;
        exp.has_data = false;
        exp.stored_science = 0.0;
        Ok(())
    }
}
