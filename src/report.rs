//! Human-readable progress and result output.

use crate::{engine::Comparison, runner::CycleReport, stats::Summary};
use std::io::Write;

/// Observes a measurement run. Reporters cannot influence the run.
pub trait Reporter {
    /// Called after every completed cycle with the trial's statistics so far.
    fn cycle(&mut self, trial: &str, summary: &Summary, report: &CycleReport);

    /// Called once after every trial has been measured.
    fn complete(&mut self, comparison: &Comparison);
}

/// Writes one line per cycle and a final line naming the fastest trial.
///
/// ```text
/// curl - keepalive x 41.27 ops/sec ±0.84% (12 runs sampled)
/// Fastest is curl - keepalive
/// ```
pub struct ConsoleReporter<W> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            tracing::warn!("failed to write report: {}", e);
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn cycle(&mut self, trial: &str, summary: &Summary, report: &CycleReport) {
        self.line(&cycle_line(trial, summary, report.failed()));
    }

    fn complete(&mut self, comparison: &Comparison) {
        if let Some(fastest) = comparison.fastest() {
            self.line(&format!("Fastest is {}", fastest.name));
        }
    }
}

/// Format the per-cycle line for a trial.
pub fn cycle_line(trial: &str, summary: &Summary, failed: usize) -> String {
    let runs = summary.count();
    let mut line = format!(
        "{} x {:.2} ops/sec \u{b1}{:.2}% ({} run{} sampled)",
        trial,
        summary.hz(),
        summary.rme(),
        runs,
        if runs == 1 { "" } else { "s" },
    );

    if failed > 0 {
        line.push_str(&format!(" [{} failed downloads]", failed));
    }

    line
}
