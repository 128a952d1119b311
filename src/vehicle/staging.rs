use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::LinkError;
use crate::link::ActuationSink;
use crate::telemetry::Snapshot;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the simulator reports no decouple stage below the
/// current one (typically the final stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStagePolicy {
    /// Report no fuel, never command a stage-advance.
    #[default]
    Hold,
    /// Treat as depleted: one stage-advance per stage index.
    StageOnce,
}

/// When a phase lets the supervisor command a stage-advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingTrigger {
    /// Next decouple stage has run dry.
    FuelDepleted,
    /// Current thrust has collapsed (jet engines).
    ThrustLost,
    /// Never; fuel is still reported.
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Solid and liquid amounts below this count as empty.
    pub fuel_epsilon: f64,
    /// Thrust (N) below this counts as flame-out for air-breathing stages.
    pub thrust_epsilon: f64,
    pub missing_stage: MissingStagePolicy,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self { fuel_epsilon: 0.1, thrust_epsilon: 0.1, missing_stage: MissingStagePolicy::Hold }
    }
}

// ---------------------------------------------------------------------------
// Fuel supervisor
// ---------------------------------------------------------------------------

/// Watches the next decouple stage and advances staging once it runs dry.
///
/// A stage-advance is sent at most once per stage index: after commanding at
/// stage `s`, nothing more is sent until the reported stage differs from `s`.
#[derive(Debug, Clone, Default)]
pub struct FuelSupervisor {
    pub config: StagingConfig,
    staged_at: Option<i32>,
    warned_missing_at: Option<i32>,
    pending: Option<i32>,
}

impl FuelSupervisor {
    pub fn new(config: StagingConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Returns the larger of the two fuel amounts, or 0 when the stage is
    /// depleted (staging if `trigger` is set).
    pub fn check_and_maybe_stage<A: ActuationSink + ?Sized>(
        &mut self,
        snapshot: &Snapshot,
        sink: &mut A,
        trigger: bool,
    ) -> Result<f64, LinkError> {
        self.observe_stage(snapshot.stage);

        match snapshot.decouple_fuel {
            Some(fuel) if !fuel.is_depleted(self.config.fuel_epsilon) => Ok(fuel.remaining()),
            Some(fuel) => {
                if trigger {
                    self.stage(snapshot.stage, sink, || {
                        format!(
                            "solid fuel is at {:.2} and liquid fuel at {:.2}",
                            fuel.solid, fuel.liquid
                        )
                    })?;
                }
                Ok(0.0)
            }
            None => {
                match self.config.missing_stage {
                    MissingStagePolicy::Hold => {
                        if self.warned_missing_at != Some(snapshot.stage) {
                            warn!("No decouple stage below stage {}, holding", snapshot.stage);
                            self.warned_missing_at = Some(snapshot.stage);
                        }
                    }
                    MissingStagePolicy::StageOnce if trigger => {
                        self.stage(snapshot.stage, sink, || "no decouple stage reported".to_string())?;
                    }
                    MissingStagePolicy::StageOnce => {}
                }
                Ok(0.0)
            }
        }
    }

    /// Air-breathing variant: stage when the current thrust has collapsed.
    /// Returns true if a stage-advance was sent.
    pub fn check_thrust_and_maybe_stage<A: ActuationSink + ?Sized>(
        &mut self,
        snapshot: &Snapshot,
        sink: &mut A,
    ) -> Result<bool, LinkError> {
        self.observe_stage(snapshot.stage);
        if snapshot.thrust >= self.config.thrust_epsilon {
            return Ok(false);
        }
        self.stage(snapshot.stage, sink, || format!("thrust is at {:.2}", snapshot.thrust))
    }

    /// Stage index of a stage-advance sent since the last call, if any.
    pub fn take_staged(&mut self) -> Option<i32> {
        self.pending.take()
    }

    fn observe_stage(&mut self, stage: i32) {
        if self.staged_at.is_some_and(|s| s != stage) {
            self.staged_at = None;
        }
    }

    fn stage<A: ActuationSink + ?Sized>(
        &mut self,
        stage: i32,
        sink: &mut A,
        reason: impl FnOnce() -> String,
    ) -> Result<bool, LinkError> {
        if self.staged_at == Some(stage) {
            return Ok(false);
        }
        info!("Staging because {}! Current stage is {stage}", reason());
        sink.activate_next_stage()?;
        self.staged_at = Some(stage);
        self.pending = Some(stage);
        Ok(true)
    }
}
