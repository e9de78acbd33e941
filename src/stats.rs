//! Running timing statistics for a trial.

use std::time::Duration;

/// Two-tailed 95% critical values of Student's t-distribution, indexed by
/// degrees of freedom minus one.
static T_TABLE: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.16,
    2.145, 2.131, 2.12, 2.11, 2.101, 2.093, 2.086, 2.08, 2.074, 2.069, 2.064, 2.06, 2.056, 2.052,
    2.048, 2.045, 2.042,
];

/// Critical value used once the degrees of freedom exceed the table.
const T_INFINITY: f64 = 1.96;

/// Running mean and variance of a trial's samples.
///
/// Samples are folded in one at a time using Welford's algorithm and are not
/// retained.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    count: u64,
    mean: f64,
    m2: f64,
    total: Duration,
}

impl Summary {
    /// Fold one sample into the summary.
    pub fn push(&mut self, sample: Duration) {
        let x = sample.as_secs_f64();

        self.count += 1;
        self.total += sample;

        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Number of samples folded in so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of all samples.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Mean elapsed time, in seconds.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance, in seconds squared. Zero with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean.
    pub fn sem(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.std_dev() / (self.count as f64).sqrt()
        }
    }

    /// Margin of error of the mean at 95% confidence, in seconds.
    pub fn moe(&self) -> f64 {
        self.sem() * critical_value(self.count.saturating_sub(1))
    }

    /// Relative margin of error, as a percentage of the mean.
    pub fn rme(&self) -> f64 {
        if self.mean > 0.0 {
            self.moe() / self.mean * 100.0
        } else {
            0.0
        }
    }

    /// Cycles per second.
    pub fn hz(&self) -> f64 {
        if self.mean > 0.0 {
            1.0 / self.mean
        } else {
            0.0
        }
    }
}

fn critical_value(degrees_of_freedom: u64) -> f64 {
    match degrees_of_freedom {
        0 => T_INFINITY,
        df => T_TABLE
            .get(df as usize - 1)
            .copied()
            .unwrap_or(T_INFINITY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn summary(samples_ms: &[u64]) -> Summary {
        let mut summary = Summary::default();
        for &ms in samples_ms {
            summary.push(Duration::from_millis(ms));
        }
        summary
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let summary = Summary::default();

        assert_eq!(summary.count(), 0);
        assert_eq!(summary.mean(), 0.0);
        assert_eq!(summary.rme(), 0.0);
        assert_eq!(summary.hz(), 0.0);
    }

    #[test]
    fn mean_and_variance_match_direct_computation() {
        let summary = summary(&[100, 200, 300, 400]);

        assert_eq!(summary.count(), 4);
        assert!(close(summary.mean(), 0.25));
        // Sum of squared deviations is 0.05, over n - 1.
        assert!(close(summary.variance(), 0.05 / 3.0));
        assert!(close(summary.hz(), 4.0));
        assert_eq!(summary.total(), Duration::from_secs(1));
    }

    #[test]
    fn single_sample_has_no_spread() {
        let summary = summary(&[42]);

        assert_eq!(summary.variance(), 0.0);
        assert_eq!(summary.rme(), 0.0);
    }

    #[test]
    fn identical_samples_have_zero_margin() {
        assert_eq!(summary(&[10, 10, 10, 10, 10]).rme(), 0.0);
    }

    #[test]
    fn margin_uses_t_distribution() {
        let summary = summary(&[100, 200]);
        let expected = summary.sem() * 12.706;

        assert!(close(summary.moe(), expected));
    }

    #[test_case(1, 12.706)]
    #[test_case(30, 2.042)]
    #[test_case(31, 1.96)]
    #[test_case(1000, 1.96)]
    fn critical_values(df: u64, expected: f64) {
        assert_eq!(critical_value(df), expected);
    }
}
