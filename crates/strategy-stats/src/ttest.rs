use crate::descriptive::{mean, sample_variance};
use crate::distribution::student_t_cdf;
use crate::error::StatsError;

/// One-sample Student t-test of a sample mean against a hypothesized value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneSampleTTest {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Test statistic. A zero-variance sample gives `0` when the mean equals
    /// the hypothesized value and `±inf` otherwise.
    pub t: f64,
    pub df: f64,
}

impl OneSampleTTest {
    pub fn new(samples: &[f64], hypothesized_mean: f64) -> Result<Self, StatsError> {
        let (Some(mean), Some(variance)) = (mean(samples), sample_variance(samples)) else {
            return Err(StatsError::TooFewPoints {
                needed: 2,
                actual: samples.len(),
            });
        };
        let n = samples.len();
        let std_dev = variance.sqrt();
        let diff = mean - hypothesized_mean;
        let std_error = std_dev / (n as f64).sqrt();
        let t = if std_error > 0.0 {
            diff / std_error
        } else if diff == 0.0 {
            0.0
        } else {
            diff.signum() * f64::INFINITY
        };

        Ok(Self {
            n,
            mean,
            std_dev,
            t,
            df: (n - 1) as f64,
        })
    }

    pub fn against_zero(samples: &[f64]) -> Result<Self, StatsError> {
        Self::new(samples, 0.0)
    }

    #[must_use]
    pub fn p_value_two_sided(&self) -> f64 {
        (2.0 * (1.0 - student_t_cdf(self.t.abs(), self.df))).clamp(0.0, 1.0)
    }

    /// P(T ≥ t): evidence that the mean is above the hypothesized value.
    #[must_use]
    pub fn p_value_greater(&self) -> f64 {
        1.0 - student_t_cdf(self.t, self.df)
    }

    /// P(T ≤ t): evidence that the mean is below the hypothesized value.
    #[must_use]
    pub fn p_value_less(&self) -> f64 {
        student_t_cdf(self.t, self.df)
    }
}
