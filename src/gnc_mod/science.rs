use std::collections::HashSet;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::command::{Command, Guidance, Tick};
use super::controller::{seconds, Controller};
use crate::sim::event::{EventKind, FlightEvent, PhaseOutcome};
use crate::telemetry::{Experiment, Scope};
use crate::vehicle::StagingTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScienceConfig {
    /// Smallest obtainable science worth a run.
    pub min_science: f64,
    /// Smallest remaining subject value worth a run, [0, 1].
    pub min_scientific_value: f64,
    pub interval: f64,
}

impl Default for ScienceConfig {
    fn default() -> Self {
        Self { min_science: 5.0, min_scientific_value: 0.01, interval: 2.0 }
    }
}

/// What to do with one experiment this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScienceAction {
    Skip,
    Run,
    ResetAndRun,
}

impl ScienceConfig {
    pub fn action(&self, exp: &Experiment) -> ScienceAction {
        if !exp.available || exp.inoperable {
            return ScienceAction::Skip;
        }
        let Some(subject) = exp.subject else {
            return ScienceAction::Skip;
        };
        let potential = subject.obtainable();
        if potential < self.min_science || subject.scientific_value <= self.min_scientific_value {
            return ScienceAction::Skip;
        }
        match (exp.has_data, exp.rerunnable) {
            (false, _) => ScienceAction::Run,
            (true, true) if exp.stored_science < potential => ScienceAction::ResetAndRun,
            _ => ScienceAction::Skip,
        }
    }
}

/// Keeps every science part busy while the vessel flies through new
/// biomes and situations. Ends once the vessel is down.
#[derive(Debug, Clone, Default)]
pub struct ScienceRunner {
    pub config: ScienceConfig,
}

impl ScienceRunner {
    pub fn new(config: ScienceConfig) -> Self {
        Self { config }
    }
}

impl Controller for ScienceRunner {
    fn control(&mut self, tick: &Tick<'_>) -> Guidance {
        let snap = tick.snapshot;
        if snap.situation.is_down() {
            info!("Vessel is {:?}, science run over", snap.situation);
            return Guidance::done(PhaseOutcome::Completed);
        }

        let mut g = Guidance::idle();
        // Parts with several copies share one subject; one run per tick is enough.
        let mut busy: HashSet<&str> = HashSet::new();
        for exp in &snap.experiments {
            let action = self.config.action(exp);
            if action == ScienceAction::Skip || !busy.insert(exp.part_name.as_str()) {
                continue;
            }
            let science = exp.subject.map_or(0.0, |s| s.obtainable());
            if action == ScienceAction::ResetAndRun {
                debug!("Resetting {} holding {:.1} science", exp.part_name, exp.stored_science);
                g.commands.push(Command::ResetExperiment(exp.id));
            }
            info!("Running {} for {science:.1} science", exp.part_name);
            g.commands.push(Command::RunExperiment(exp.id));
            g.events.push(FlightEvent::new(
                snap.ut,
                EventKind::ExperimentRun { part: exp.part_name.clone(), science },
            ));
        }
        g
    }

    fn scope(&self) -> Scope {
        Scope { experiments: true, ..Scope::BASIC }
    }

    fn interval(&self) -> Duration {
        seconds(self.config.interval)
    }

    fn staging(&self) -> StagingTrigger {
        StagingTrigger::Off
    }

    fn name(&self) -> &str {
        "ScienceRunner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc_mod::command::PhaseStatus;
    use crate::telemetry::{ExperimentId, ScienceSubject, Situation, Snapshot};
    use rstest::rstest;

    fn exp(id: usize, part: &str, has_data: bool, stored: f64, value: f64, cap: f64) -> Experiment {
        Experiment {
            id: ExperimentId(id),
            part_name: part.into(),
            available: true,
            inoperable: false,
            has_data,
            rerunnable: true,
            stored_science: stored,
            subject: Some(ScienceSubject { scientific_value: value, science_cap: cap }),
        }
    }

    #[rstest]
    #[case(exp(0, "goo", false, 0.0, 1.0, 10.0), ScienceAction::Run)]
    #[case(exp(0, "goo", false, 0.0, 0.4, 10.0), ScienceAction::Skip)] // 4 < min_science
    #[case(exp(0, "goo", false, 0.0, 0.005, 2_000.0), ScienceAction::Skip)] // value too low
    #[case(exp(0, "goo", true, 3.0, 1.0, 10.0), ScienceAction::ResetAndRun)]
    #[case(exp(0, "goo", true, 10.0, 1.0, 10.0), ScienceAction::Skip)]
    fn run_decision(#[case] e: Experiment, #[case] expected: ScienceAction) {
        assert_eq!(ScienceConfig::default().action(&e), expected);
    }

    #[test]
    fn inoperable_or_single_use_is_skipped() {
        let cfg = ScienceConfig::default();
        let mut e = exp(0, "goo", false, 0.0, 1.0, 10.0);
        e.inoperable = true;
        assert_eq!(cfg.action(&e), ScienceAction::Skip);

        let mut e = exp(0, "goo", true, 3.0, 1.0, 10.0);
        e.rerunnable = false;
        assert_eq!(cfg.action(&e), ScienceAction::Skip);
    }

    #[test]
    fn one_run_per_part_name() {
        let snap = Snapshot {
            situation: Situation::Flying,
            experiments: vec![
                exp(0, "goo", false, 0.0, 1.0, 10.0),
                exp(1, "goo", false, 0.0, 1.0, 10.0),
                exp(2, "thermo", true, 1.0, 1.0, 10.0),
            ],
            ..Snapshot::default()
        };
        let mut runner = ScienceRunner::default();
        let g = runner.control(&Tick { snapshot: &snap, dt: 2.0, fuel: 0.0 });
        assert_eq!(
            g.commands,
            vec![
                Command::RunExperiment(ExperimentId(0)),
                Command::ResetExperiment(ExperimentId(2)),
                Command::RunExperiment(ExperimentId(2)),
            ]
        );
        assert!(g.setpoint.is_none());
        assert_eq!(g.status, PhaseStatus::Running);
    }

    #[test]
    fn ends_when_landed() {
        let snap = Snapshot { situation: Situation::Splashed, ..Snapshot::default() };
        let mut runner = ScienceRunner::default();
        assert!(runner.control(&Tick { snapshot: &snap, dt: 2.0, fuel: 0.0 }).is_done());
    }
}
