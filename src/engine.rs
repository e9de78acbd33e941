//! The measurement engine.
//!
//! An [`Engine`] owns a [`Registry`] of trials and measures them one after
//! another. Each cycle of a trial goes through the same sequence:
//!
//! ```text
//! Setup -> Running -> Teardown -> Aggregating -> (Setup | Done)
//! ```
//!
//! Teardown always runs once setup has succeeded, even when the cycle itself
//! fails. Only the time spent in `Running` is measured.

use crate::{
    config::{self, ClientConfig, Origin},
    error::{Error, Phase},
    files::file_names,
    fixture::Fixture,
    report::Reporter,
    runner::{CycleReport, Downloads},
    stats::Summary,
};
use std::{
    path::Path,
    time::{Duration, Instant},
};

/// The body of a trial: the work that is timed on every cycle.
pub trait Workload: Send + Sync {
    /// Run one cycle, using `scratch` as the destination directory.
    ///
    /// An error returned here is fatal to the trial. Failures of individual
    /// tasks belong in the returned report instead.
    fn run_cycle(&self, scratch: &Path) -> Result<CycleReport, Error>;
}

impl<F> Workload for F
where
    F: Fn(&Path) -> Result<CycleReport, Error> + Send + Sync,
{
    fn run_cycle(&self, scratch: &Path) -> Result<CycleReport, Error> {
        self(scratch)
    }
}

/// One named benchmark entry.
pub struct Trial {
    name: String,
    fixture: Fixture,
    workload: Box<dyn Workload>,
}

impl Trial {
    pub fn new(name: impl Into<String>, fixture: Fixture, workload: impl Workload + 'static) -> Self {
        Self {
            name: name.into(),
            fixture,
            workload: Box::new(workload),
        }
    }

    /// Create a trial downloading the standard file set with the given
    /// client configuration, into `<base>/<slug of the name>`.
    pub fn downloads(config: ClientConfig, origin: Origin, base: &Path) -> Self {
        let fixture = Fixture::new(base.join(config.slug()));

        Self::new(
            config.name().to_owned(),
            fixture,
            Downloads::new(config, origin, file_names()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }
}

/// The ordered set of trials an engine measures. Registration order is
/// measurement order and breaks ranking ties.
#[derive(Default)]
pub struct Registry {
    trials: Vec<Trial>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the standard client configurations against an origin.
    pub fn with_defaults(origin: &Origin, base: &Path) -> Self {
        config::default_configs()
            .into_iter()
            .fold(Self::new(), |registry, config| {
                registry.trial(Trial::downloads(config, origin.clone(), base))
            })
    }

    /// Add a trial, builder style.
    pub fn trial(mut self, trial: Trial) -> Self {
        self.add(trial);
        self
    }

    pub fn add(&mut self, trial: Trial) {
        self.trials.push(trial);
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.trials.iter().map(Trial::name)
    }
}

/// Decides when a trial has been measured enough.
///
/// A trial stops once it has at least `min_cycles` samples and its relative
/// margin of error is at most `max_rme` percent, or its measured time has
/// reached `max_time`. It always stops at `max_cycles`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StopRule {
    pub min_cycles: u64,
    pub max_cycles: u64,
    pub max_time: Option<Duration>,
    pub max_rme: f64,
}

impl Default for StopRule {
    fn default() -> Self {
        Self {
            min_cycles: 5,
            max_cycles: 100,
            max_time: Some(Duration::from_secs(5)),
            max_rme: 1.0,
        }
    }
}

impl StopRule {
    /// Run exactly `cycles` cycles per trial.
    pub fn fixed(cycles: u64) -> Self {
        Self {
            min_cycles: cycles,
            max_cycles: cycles,
            max_time: None,
            max_rme: 0.0,
        }
    }

    pub fn is_satisfied(&self, summary: &Summary) -> bool {
        let count = summary.count();

        if count >= self.max_cycles.max(1) {
            return true;
        }

        if count < self.min_cycles.max(2) {
            return false;
        }

        if summary.rme() <= self.max_rme {
            return true;
        }

        matches!(self.max_time, Some(max_time) if summary.total() >= max_time)
    }
}

/// Aggregated results of one trial.
#[derive(Clone, Debug)]
pub struct TrialResult {
    pub name: String,
    pub summary: Summary,
    /// Downloads that failed across all cycles.
    pub failures: usize,
}

/// All trial results, fastest first.
#[derive(Clone, Debug, Default)]
pub struct Comparison {
    ranked: Vec<TrialResult>,
}

impl Comparison {
    /// Rank results ascending by mean elapsed time. Equal means keep their
    /// given order.
    pub fn new(mut results: Vec<TrialResult>) -> Self {
        results.sort_by(|a, b| a.summary.mean().total_cmp(&b.summary.mean()));

        Self { ranked: results }
    }

    /// Results ordered fastest first.
    pub fn ranked(&self) -> &[TrialResult] {
        &self.ranked
    }

    pub fn fastest(&self) -> Option<&TrialResult> {
        self.ranked.first()
    }

    pub fn get(&self, name: &str) -> Option<&TrialResult> {
        self.ranked.iter().find(|r| r.name == name)
    }
}

/// Measures every registered trial in turn and ranks them.
pub struct Engine {
    registry: Registry,
    rule: StopRule,
}

impl Engine {
    pub fn new(registry: Registry, rule: StopRule) -> Self {
        Self { registry, rule }
    }

    /// Measure all trials sequentially, reporting each cycle as it completes.
    ///
    /// Stops at the first fatal error, which names the trial and phase that
    /// failed.
    pub fn run(&self, reporter: &mut dyn Reporter) -> Result<Comparison, Error> {
        let mut results = Vec::with_capacity(self.registry.len());

        for trial in &self.registry.trials {
            results.push(self.measure(trial, reporter)?);
        }

        let comparison = Comparison::new(results);
        reporter.complete(&comparison);

        Ok(comparison)
    }

    fn measure(&self, trial: &Trial, reporter: &mut dyn Reporter) -> Result<TrialResult, Error> {
        let span = tracing::info_span!("trial", name = trial.name());
        let _enter = span.enter();

        let mut summary = Summary::default();
        let mut failures = 0;

        while !self.rule.is_satisfied(&summary) {
            let (elapsed, report) = self.cycle(trial)?;

            summary.push(elapsed);
            failures += report.failed();

            tracing::debug!(
                cycle = summary.count(),
                elapsed = ?elapsed,
                failed = report.failed(),
                "cycle complete"
            );

            reporter.cycle(trial.name(), &summary, &report);
        }

        Ok(TrialResult {
            name: trial.name().to_owned(),
            summary,
            failures,
        })
    }

    fn cycle(&self, trial: &Trial) -> Result<(Duration, CycleReport), Error> {
        if let Err(e) = trial.fixture.setup() {
            // Undo whatever part of the setup did happen before giving up.
            if let Err(teardown) = trial.fixture.teardown() {
                tracing::debug!(error = %teardown, "teardown after failed setup");
            }

            return Err(e.in_trial(trial.name(), Phase::Setup));
        }

        let start = Instant::now();
        let outcome = trial.workload.run_cycle(trial.fixture.path());
        let elapsed = start.elapsed();

        let teardown = trial.fixture.teardown();

        let report = outcome.map_err(|e| e.in_trial(trial.name(), Phase::Run))?;
        teardown.map_err(|e| e.in_trial(trial.name(), Phase::Teardown))?;

        Ok((elapsed, report))
    }
}
