//! Logistic regression with Firth's bias-reduced likelihood.
//!
//! Plain maximum likelihood diverges when a predictor perfectly separates
//! the outcome, which is common for small per-player game samples. Firth's
//! penalty (Jeffreys prior) keeps the estimates finite so Wald tests remain
//! usable. The model has no intercept; callers add a constant column if
//! they want one.

use crate::distribution::normal_cdf;
use crate::error::StatsError;
use crate::linalg::{dot, Matrix};

/// Fitted coefficients with Wald standard errors.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub iterations: usize,
}

impl LogisticFit {
    #[must_use]
    pub fn z_score(&self, index: usize) -> f64 {
        self.coefficients[index] / self.std_errors[index]
    }

    /// Two-sided Wald p-value for coefficient `index`.
    #[must_use]
    pub fn p_value(&self, index: usize) -> f64 {
        2.0 * (1.0 - normal_cdf(self.z_score(index).abs()))
    }
}

/// Newton-Raphson solver for the Firth-penalized score equations.
#[derive(Debug, Clone, Copy)]
pub struct FirthLogistic {
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Largest absolute change allowed to any coefficient in one step.
    pub max_step: f64,
}

impl Default for FirthLogistic {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            max_step: 5.0,
        }
    }
}

impl FirthLogistic {
    /// Fit `outcome` (0/1) on the columns of `design`.
    pub fn fit(&self, design: &Matrix, outcome: &[f64]) -> Result<LogisticFit, StatsError> {
        let n = design.rows();
        let k = design.cols();
        if outcome.len() != n {
            return Err(StatsError::DimensionMismatch {
                expected: n,
                actual: outcome.len(),
            });
        }
        if n == 0 || k == 0 {
            return Err(StatsError::TooFewPoints { needed: 1, actual: n });
        }

        let mut beta = vec![0.0; k];
        for iteration in 1..=self.max_iterations {
            let probs = fitted_probabilities(design, &beta)?;
            let info_inv = fisher_information(design, &probs).inverse()?;

            let mut score = vec![0.0; k];
            for i in 0..n {
                let x = design.row(i);
                let p = probs[i];
                let w = p * (1.0 - p);
                let leverage = w * quadratic_form(&info_inv, x);
                let residual = outcome[i] - p + leverage * (0.5 - p);
                for (s, xj) in score.iter_mut().zip(x) {
                    *s += xj * residual;
                }
            }

            let mut step = info_inv.mul_vec(&score)?;
            let largest = step.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
            if largest > self.max_step {
                let scale = self.max_step / largest;
                step.iter_mut().for_each(|s| *s *= scale);
            }
            for (b, s) in beta.iter_mut().zip(&step) {
                *b += s;
            }

            if largest < self.tolerance {
                let probs = fitted_probabilities(design, &beta)?;
                let info_inv = fisher_information(design, &probs).inverse()?;
                let std_errors = (0..k).map(|j| info_inv[(j, j)].sqrt()).collect();
                return Ok(LogisticFit {
                    coefficients: beta,
                    std_errors,
                    iterations: iteration,
                });
            }
        }

        Err(StatsError::NoConvergence(self.max_iterations))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn fitted_probabilities(design: &Matrix, beta: &[f64]) -> Result<Vec<f64>, StatsError> {
    Ok(design.mul_vec(beta)?.into_iter().map(sigmoid).collect())
}

/// `Xᵀ W X` with `W = diag(p(1-p))`.
fn fisher_information(design: &Matrix, probs: &[f64]) -> Matrix {
    let k = design.cols();
    let mut info = Matrix::zeros(k, k);
    for (i, p) in probs.iter().enumerate() {
        let w = p * (1.0 - p);
        let x = design.row(i);
        for a in 0..k {
            for b in 0..k {
                info[(a, b)] += w * x[a] * x[b];
            }
        }
    }
    info
}

/// `xᵀ M x`
fn quadratic_form(m: &Matrix, x: &[f64]) -> f64 {
    (0..m.rows()).map(|r| x[r] * dot(m.row(r), x)).sum()
}
