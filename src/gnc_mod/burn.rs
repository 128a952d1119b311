use std::time::Duration;

use log::{info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::command::{Attitude, Command, Guidance, Setpoint, Tick};
use super::controller::{seconds, Controller};
use crate::orbital::BurnPlan;
use crate::sim::event::{AbortReason, EventKind, FlightEvent, PhaseOutcome};
use crate::telemetry::{ManeuverNode, Scope, Snapshot};

// ---------------------------------------------------------------------------
// Burn configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnConfig {
    /// Warp stops this many seconds before ignition.
    pub warp_buffer: f64,
    /// Per-axis tolerance on the facing direction in the node frame.
    /// Component-wise, not an angle.
    pub alignment_tolerance: [f64; 3],
    /// Full throttle above this remaining delta-v, proportional below, m/s.
    pub coarse_threshold: f64,
    /// Remaining delta-v at which the burn is complete, m/s.
    pub cutoff: f64,
    /// How long remaining delta-v may keep growing before aborting, s.
    pub divergence_grace: f64,
    /// Ignite once the centred start time is this close, s.
    pub ignition_lead: f64,
    pub ready_log_interval: f64,
    pub wait_interval: f64,
    pub burn_interval: f64,
}

impl Default for BurnConfig {
    fn default() -> Self {
        Self {
            warp_buffer: 20.0,
            alignment_tolerance: [0.05, 0.05, 0.05],
            coarse_threshold: 20.0,
            cutoff: 0.0001,
            divergence_grace: 1.0,
            ignition_lead: 0.1,
            ready_log_interval: 1.0,
            wait_interval: 0.05,
            burn_interval: 0.01,
        }
    }
}

/// Burn direction in the node frame (prograde of the maneuver).
pub fn burn_direction() -> Vector3<f64> {
    Vector3::y()
}

/// Per-axis facing error, and whether every axis is inside its tolerance.
pub fn alignment(facing: &Vector3<f64>, tolerance: &[f64; 3]) -> ([f64; 3], bool) {
    let err = facing - burn_direction();
    let err = [err.x, err.y, err.z];
    let ok = err.iter().zip(tolerance).all(|(e, tol)| e.abs() < *tol);
    (err, ok)
}

/// Throttle for the remaining delta-v: full above the coarse threshold,
/// proportional below it.
pub fn burn_throttle(remaining_delta_v: f64, coarse_threshold: f64) -> f64 {
    if remaining_delta_v > coarse_threshold {
        1.0
    } else {
        remaining_delta_v / coarse_threshold
    }
}

// ---------------------------------------------------------------------------
// Executor state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurnState {
    Planning,
    Waiting { plan: BurnPlan, last_log: Option<f64> },
    /// `lowest_remaining` is the smallest remaining delta-v seen this burn.
    Burning { lowest_remaining: f64, diverging_since: Option<f64>, fine: bool },
    Finished,
}

/// Flies a single maneuver node: warp, align, burn, remove the node.
#[derive(Debug, Clone)]
pub struct BurnExecutor {
    pub config: BurnConfig,
    state: BurnState,
}

impl BurnExecutor {
    pub fn new(config: BurnConfig) -> Self {
        Self { config, state: BurnState::Planning }
    }

    pub fn state(&self) -> BurnState {
        self.state
    }

    fn point_at_node(throttle: f64) -> Setpoint {
        Setpoint { attitude: Attitude::NodeDirection(burn_direction()), throttle, brakes: false }
    }

    fn abort(&mut self, reason: AbortReason, setpoint: Option<Setpoint>) -> Guidance {
        self.state = BurnState::Finished;
        let mut g = Guidance::done(PhaseOutcome::Aborted(reason));
        g.setpoint = setpoint;
        g
    }

    fn plan(&mut self, snap: &Snapshot, node: &ManeuverNode) -> Guidance {
        let Some(plan) = BurnPlan::new(node.delta_v, snap.available_thrust, snap.specific_impulse, snap.mass) else {
            warn!(
                "Cannot plan burn: thrust {:.1} N, Isp {:.1} s",
                snap.available_thrust, snap.specific_impulse
            );
            return self.abort(AbortReason::NoThrust, None);
        };
        info!(
            "Burn of {:.1} m/s takes {:.1} s; warping to node ({} seconds before maneuver starts)",
            node.delta_v, plan.burn_time, self.config.warp_buffer
        );
        self.state = BurnState::Waiting { plan, last_log: None };

        let mut g = Guidance::running(Self::point_at_node(0.0));
        let warp_at = snap.ut + plan.start_in(node.time_to) - self.config.warp_buffer;
        if warp_at > snap.ut {
            g.commands.push(Command::WarpTo(warp_at));
        }
        g
    }

    fn wait(&mut self, snap: &Snapshot, node: &ManeuverNode, plan: BurnPlan, last_log: Option<f64>) -> Guidance {
        let cfg = &self.config;
        let start_in = plan.start_in(node.time_to);
        let (error, aligned) = alignment(&node.facing, &cfg.alignment_tolerance);

        if start_in > cfg.ignition_lead {
            let due = last_log.map_or(true, |t| snap.ut - t >= cfg.ready_log_interval);
            let last_log = if due {
                info!("Ready: {aligned}, maneuver starting in {}...", start_in as i64);
                Some(snap.ut)
            } else {
                last_log
            };
            self.state = BurnState::Waiting { plan, last_log };
            return Guidance::running(Self::point_at_node(0.0));
        }

        if !aligned {
            warn!(
                "Spacecraft was not facing in the correct direction. Direction: {:?}, tolerance: {:?}",
                node.facing, cfg.alignment_tolerance
            );
            return self.abort(AbortReason::Misaligned { error }, None);
        }

        info!("Starting maneuver burn.");
        self.state = BurnState::Burning {
            lowest_remaining: node.remaining_delta_v,
            diverging_since: None,
            fine: false,
        };
        let throttle = burn_throttle(node.remaining_delta_v, cfg.coarse_threshold);
        Guidance::running(Self::point_at_node(throttle)).with_event(FlightEvent::new(snap.ut, EventKind::BurnStarted))
    }

    fn burn(&mut self, snap: &Snapshot, node: &ManeuverNode, lowest: f64, since: Option<f64>, fine: bool) -> Guidance {
        let cfg = &self.config;
        let remaining = node.remaining_delta_v;

        if remaining <= cfg.cutoff {
            info!("Maneuver completed.");
            self.state = BurnState::Finished;
            let mut g = Guidance::done(PhaseOutcome::Completed);
            g.setpoint = Some(Self::point_at_node(0.0));
            return g;
        }

        // Remaining delta-v should only shrink. Repeated frames keep the timer
        // running; only a new low clears it.
        let diverging_since = if remaining > lowest { Some(since.unwrap_or(snap.ut)) } else { None };
        if let Some(t) = diverging_since {
            if snap.ut - t >= cfg.divergence_grace {
                warn!("Remaining delta-v grew from {lowest:.3} to {remaining:.3} m/s, aborting burn");
                return self.abort(
                    AbortReason::Diverging { remaining_delta_v: remaining },
                    Some(Self::point_at_node(0.0)),
                );
            }
        }

        let throttle = burn_throttle(remaining, cfg.coarse_threshold);
        let mut g = Guidance::running(Self::point_at_node(throttle));
        let now_fine = remaining <= cfg.coarse_threshold;
        if now_fine && !fine {
            info!("Maneuver almost done. Fine tuning.");
            g.events.push(FlightEvent::new(snap.ut, EventKind::BurnFineTuning));
        }
        self.state = BurnState::Burning {
            lowest_remaining: lowest.min(remaining),
            diverging_since,
            fine: fine || now_fine,
        };
        g
    }
}

impl Controller for BurnExecutor {
    fn control(&mut self, tick: &Tick<'_>) -> Guidance {
        let snap = tick.snapshot;
        let state = self.state;
        let Some(node) = snap.node else {
            return match state {
                // Node removed from outside mid-burn.
                BurnState::Burning { .. } => {
                    self.state = BurnState::Finished;
                    let mut g = Guidance::done(PhaseOutcome::Completed);
                    g.setpoint = Some(Self::point_at_node(0.0));
                    g
                }
                BurnState::Finished => Guidance::done(PhaseOutcome::Completed),
                _ => {
                    info!("No maneuver node found.");
                    self.abort(AbortReason::NoManeuverNode, None)
                }
            };
        };

        match state {
            BurnState::Planning => self.plan(snap, &node),
            BurnState::Waiting { plan, last_log } => self.wait(snap, &node, plan, last_log),
            BurnState::Burning { lowest_remaining, diverging_since, fine } => {
                self.burn(snap, &node, lowest_remaining, diverging_since, fine)
            }
            BurnState::Finished => Guidance::done(PhaseOutcome::Completed),
        }
    }

    fn start(&mut self, snapshot: &Snapshot) -> Vec<Command> {
        // Without a node the first tick aborts; leave the autopilot alone.
        if snapshot.node.is_some() {
            vec![Command::EngageAutopilot]
        } else {
            vec![]
        }
    }

    fn finish(&mut self, outcome: &PhaseOutcome) -> Vec<Command> {
        match outcome {
            PhaseOutcome::Completed | PhaseOutcome::Aborted(AbortReason::Diverging { .. }) => {
                vec![Command::DisengageAutopilot, Command::RemoveNode]
            }
            _ => vec![],
        }
    }

    fn scope(&self) -> Scope {
        Scope { node: true, ..Scope::BASIC }
    }

    fn interval(&self) -> Duration {
        match self.state {
            BurnState::Burning { .. } => seconds(self.config.burn_interval),
            _ => seconds(self.config.wait_interval),
        }
    }

    fn name(&self) -> &str {
        "BurnExecutor"
    }
}
