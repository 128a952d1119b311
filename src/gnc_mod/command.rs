use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::sim::event::{FlightEvent, PhaseOutcome};
use crate::telemetry::{ExperimentId, Snapshot};

// ---------------------------------------------------------------------------
// Setpoint: what the active controller wants this tick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Attitude {
    /// Leave the autopilot targets untouched.
    #[default]
    Hold,
    /// Degrees, in the surface frame.
    PitchHeading { pitch: f64, heading: f64, roll: f64 },
    /// Unit direction in the maneuver node's reference frame.
    NodeDirection(Vector3<f64>),
}

/// Written once per tick by the active controller; the sink applies it
/// immediately, last write wins.
///
/// `throttle` may lie outside [0, 1]; the sink clamps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Setpoint {
    pub attitude: Attitude,
    pub throttle: f64,
    pub brakes: bool,
}

impl Setpoint {
    pub fn pitch_heading(pitch: f64, heading: f64, throttle: f64) -> Self {
        Self {
            attitude: Attitude::PitchHeading { pitch, heading, roll: 0.0 },
            throttle,
            brakes: false,
        }
    }

    pub fn target_pitch(&self) -> Option<f64> {
        match self.attitude {
            Attitude::PitchHeading { pitch, .. } => Some(pitch),
            _ => None,
        }
    }

    pub fn target_heading(&self) -> Option<f64> {
        match self.attitude {
            Attitude::PitchHeading { heading, .. } => Some(heading),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Autopilot response tuning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotTuning {
    /// Heading error (deg) above which the autopilot rolls into the turn.
    pub roll_threshold: f64,
    /// Per-axis (pitch, yaw, roll) deceleration time, s.
    pub deceleration_time: [f64; 3],
    /// Per-axis attenuation angle, deg.
    pub attenuation_angle: [f64; 3],
}

impl Default for AutopilotTuning {
    fn default() -> Self {
        Self {
            roll_threshold: 5.0,
            deceleration_time: [5.0, 5.0, 5.0],
            attenuation_angle: [1.0, 1.0, 1.0],
        }
    }
}

// ---------------------------------------------------------------------------
// Discrete commands beyond the setpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    EngageAutopilot,
    DisengageAutopilot,
    Tune(AutopilotTuning),
    StabilityAssist(bool),
    /// Absolute universal time to warp to, s.
    WarpTo(f64),
    RemoveNode,
    ActivateNextStage,
    RunExperiment(ExperimentId),
    ResetExperiment(ExperimentId),
    TransmitExperiment(ExperimentId),
}

// ---------------------------------------------------------------------------
// Controller output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PhaseStatus {
    Running,
    Done(PhaseOutcome),
}

/// Output of one controller tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Guidance {
    pub setpoint: Option<Setpoint>,
    pub commands: Vec<Command>,
    pub events: Vec<FlightEvent>,
    pub status: PhaseStatus,
}

impl Guidance {
    pub fn running(setpoint: Setpoint) -> Self {
        Self { setpoint: Some(setpoint), commands: vec![], events: vec![], status: PhaseStatus::Running }
    }

    pub fn idle() -> Self {
        Self { setpoint: None, commands: vec![], events: vec![], status: PhaseStatus::Running }
    }

    pub fn done(outcome: PhaseOutcome) -> Self {
        Self { setpoint: None, commands: vec![], events: vec![], status: PhaseStatus::Done(outcome) }
    }

    pub fn with_event(mut self, event: FlightEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, PhaseStatus::Done(_))
    }
}

/// Inputs of one controller tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick<'a> {
    pub snapshot: &'a Snapshot,
    /// Seconds since the previous tick.
    pub dt: f64,
    /// Fuel supervisor reading for the next decouple stage; 0 when depleted.
    pub fuel: f64,
}
