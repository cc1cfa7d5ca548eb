//! Natural cubic smoothing spline (Reinsch form).
//!
//! For a penalty weight `λ` the spline minimizes
//! `Σ (yᵢ - f(xᵢ))² + λ ∫ f''(x)² dx`. Rather than exposing `λ`, [`SmoothingSpline::fit`]
//! takes a smoothing factor `s` and searches for the `λ` whose residual sum
//! of squares equals `s`:
//!
//! - `s <= 0` interpolates the data exactly;
//! - if the least-squares cubic polynomial already has residual `<= s`, that
//!   cubic is returned (a cubic spline without interior knots).
//!
//! The fit solves `(R + λ QᵀQ) γ = Qᵀ y` for the second derivatives `γ` at
//! interior knots, with `R` tridiagonal and `QᵀQ` pentadiagonal.

use crate::error::StatsError;
use crate::linalg::Matrix;

const LOG_LAMBDA_RANGE: (f64, f64) = (-12.0, 12.0);
const BISECTION_TOLERANCE: f64 = 1e-10;
const MAX_BISECTIONS: usize = 200;
const POLYNOMIAL_DEGREE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    /// Second derivative at each knot. Zero at both ends unless the fit is
    /// the fallback polynomial.
    second_derivatives: Vec<f64>,
}

impl SmoothingSpline {
    /// Fit a spline through `(x, y)` with smoothing factor `s`.
    /// `x` must be strictly increasing and have at least three points.
    pub fn fit(x: &[f64], y: &[f64], s: f64) -> Result<Self, StatsError> {
        if x.len() != y.len() {
            return Err(StatsError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        if x.len() < 3 {
            return Err(StatsError::TooFewPoints {
                needed: 3,
                actual: x.len(),
            });
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(StatsError::NonIncreasing);
        }

        if s <= 0.0 {
            return fit_with_penalty(x, y, 0.0);
        }

        let (polynomial, polynomial_rss) = least_squares_polynomial(x, y)?;
        if polynomial_rss <= s {
            return Ok(polynomial);
        }

        // The natural spline tends to the least-squares line as λ grows, and
        // the line fits no better than the cubic, so the target is bracketed.
        // RSS grows monotonically with λ, so bisect on log10 λ.
        let (mut lo, mut hi) = LOG_LAMBDA_RANGE;
        for _ in 0..MAX_BISECTIONS {
            if hi - lo < BISECTION_TOLERANCE {
                break;
            }
            let mid = 0.5 * (lo + hi);
            let candidate = fit_with_penalty(x, y, 10f64.powf(mid))?;
            if candidate.residual_sum_of_squares(y) > s {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        fit_with_penalty(x, y, 10f64.powf(lo))
    }

    /// Sum of squared residuals against the data the spline was fitted to.
    #[must_use]
    pub fn residual_sum_of_squares(&self, y: &[f64]) -> f64 {
        self.values
            .iter()
            .zip(y)
            .map(|(f, y)| (y - f).powi(2))
            .sum()
    }

    /// Evaluate at `t`. Outside the knot range the spline continues linearly
    /// with the end slope.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        let x = &self.knots;
        let f = &self.values;
        let g = &self.second_derivatives;
        let n = x.len();

        if t <= x[0] {
            let h = x[1] - x[0];
            let slope = (f[1] - f[0]) / h - h * (2.0 * g[0] + g[1]) / 6.0;
            return f[0] - (x[0] - t) * slope;
        }
        if t >= x[n - 1] {
            let h = x[n - 1] - x[n - 2];
            let slope = (f[n - 1] - f[n - 2]) / h + h * (g[n - 2] + 2.0 * g[n - 1]) / 6.0;
            return f[n - 1] + (t - x[n - 1]) * slope;
        }

        // Last knot at or below t
        let i = x.partition_point(|&k| k <= t) - 1;
        let h = x[i + 1] - x[i];
        let a = t - x[i];
        let b = x[i + 1] - t;
        (b * f[i] + a * f[i + 1]) / h
            - a * b / 6.0 * ((1.0 + a / h) * g[i + 1] + (1.0 + b / h) * g[i])
    }
}

/// Least-squares polynomial of degree three (lower when there are fewer
/// points), on abscissae scaled to [-1, 1].
fn least_squares_polynomial(x: &[f64], y: &[f64]) -> Result<(SmoothingSpline, f64), StatsError> {
    let degree = POLYNOMIAL_DEGREE.min(x.len() - 1);
    let center = x.iter().sum::<f64>() / x.len() as f64;
    let scale = x.iter().map(|v| (v - center).abs()).fold(0.0_f64, f64::max);
    let t: Vec<f64> = x.iter().map(|v| (v - center) / scale).collect();

    let mut normal = Matrix::zeros(degree + 1, degree + 1);
    let mut moments = vec![0.0_f64; degree + 1];
    for (&ti, &yi) in t.iter().zip(y) {
        let powers: Vec<f64> = (0..=degree).map(|k| ti.powi(k as i32)).collect();
        for a in 0..=degree {
            moments[a] += powers[a] * yi;
            for b in 0..=degree {
                normal[(a, b)] += powers[a] * powers[b];
            }
        }
    }
    let coefficients = normal.inverse()?.mul_vec(&moments)?;

    let value = |ti: f64| -> f64 {
        coefficients
            .iter()
            .enumerate()
            .map(|(k, c)| c * ti.powi(k as i32))
            .sum()
    };
    let curvature = |ti: f64| -> f64 {
        (2..=degree)
            .map(|k| (k * (k - 1)) as f64 * coefficients[k] * ti.powi(k as i32 - 2))
            .sum::<f64>()
            / scale.powi(2)
    };

    // Between knots the piecewise form reproduces a cubic exactly from its
    // values and second derivatives.
    let fit = SmoothingSpline {
        knots: x.to_vec(),
        values: t.iter().map(|&ti| value(ti)).collect(),
        second_derivatives: t.iter().map(|&ti| curvature(ti)).collect(),
    };
    let rss = fit.residual_sum_of_squares(y);
    Ok((fit, rss))
}

fn fit_with_penalty(x: &[f64], y: &[f64], lambda: f64) -> Result<SmoothingSpline, StatsError> {
    let n = x.len();
    let m = n - 2;
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    // Column j of Q has entries at rows j, j+1, j+2.
    let qa: Vec<f64> = (0..m).map(|j| 1.0 / h[j]).collect();
    let qb: Vec<f64> = (0..m).map(|j| -1.0 / h[j] - 1.0 / h[j + 1]).collect();
    let qc: Vec<f64> = (0..m).map(|j| 1.0 / h[j + 1]).collect();

    let diag: Vec<f64> = (0..m)
        .map(|j| (h[j] + h[j + 1]) / 3.0 + lambda * (qa[j].powi(2) + qb[j].powi(2) + qc[j].powi(2)))
        .collect();
    let off1: Vec<f64> = (0..m.saturating_sub(1))
        .map(|j| h[j + 1] / 6.0 + lambda * (qb[j] * qa[j + 1] + qc[j] * qb[j + 1]))
        .collect();
    let off2: Vec<f64> = (0..m.saturating_sub(2))
        .map(|j| lambda * qc[j] * qa[j + 2])
        .collect();
    let rhs: Vec<f64> = (0..m)
        .map(|j| qa[j] * y[j] + qb[j] * y[j + 1] + qc[j] * y[j + 2])
        .collect();

    let gamma = solve_pentadiagonal(&diag, &off1, &off2, rhs)?;

    let mut q_gamma = vec![0.0_f64; n];
    for j in 0..m {
        q_gamma[j] += qa[j] * gamma[j];
        q_gamma[j + 1] += qb[j] * gamma[j];
        q_gamma[j + 2] += qc[j] * gamma[j];
    }

    let mut second_derivatives = Vec::with_capacity(n);
    second_derivatives.push(0.0);
    second_derivatives.extend_from_slice(&gamma);
    second_derivatives.push(0.0);

    Ok(SmoothingSpline {
        knots: x.to_vec(),
        values: y.iter().zip(&q_gamma).map(|(y, qg)| y - lambda * qg).collect(),
        second_derivatives,
    })
}

/// Solve a symmetric positive-definite pentadiagonal system by LDLᵀ.
fn solve_pentadiagonal(
    diag: &[f64],
    off1: &[f64],
    off2: &[f64],
    mut rhs: Vec<f64>,
) -> Result<Vec<f64>, StatsError> {
    let n = diag.len();
    let mut d = vec![0.0_f64; n];
    let mut l1 = vec![0.0_f64; n];
    let mut l2 = vec![0.0_f64; n];

    for i in 0..n {
        let mut v = diag[i];
        if i >= 1 {
            v -= l1[i - 1].powi(2) * d[i - 1];
        }
        if i >= 2 {
            v -= l2[i - 2].powi(2) * d[i - 2];
        }
        if v.abs() < f64::MIN_POSITIVE {
            return Err(StatsError::Singular);
        }
        d[i] = v;

        if i + 1 < n {
            let mut v = off1[i];
            if i >= 1 {
                v -= l1[i - 1] * l2[i - 1] * d[i - 1];
            }
            l1[i] = v / d[i];
        }
        if i + 2 < n {
            l2[i] = off2[i] / d[i];
        }
    }

    for i in 0..n {
        if i >= 1 {
            rhs[i] -= l1[i - 1] * rhs[i - 1];
        }
        if i >= 2 {
            rhs[i] -= l2[i - 2] * rhs[i - 2];
        }
    }
    for (z, d) in rhs.iter_mut().zip(&d) {
        *z /= d;
    }
    for i in (0..n).rev() {
        if i + 1 < n {
            rhs[i] -= l1[i] * rhs[i + 1];
        }
        if i + 2 < n {
            rhs[i] -= l2[i] * rhs[i + 2];
        }
    }
    Ok(rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<f64>, Vec<f64>) {
        let x = (0..8).map(|i| 10.0 + 5.0 * f64::from(i)).collect();
        let y = vec![0.6, 0.55, 0.5, 0.52, 0.45, 0.4, 0.48, 0.3];
        (x, y)
    }

    #[test]
    fn test_zero_smoothing_interpolates() {
        let (x, y) = sample();
        let spline = SmoothingSpline::fit(&x, &y, 0.0).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((spline.evaluate(*xi) - yi).abs() < 1e-9);
        }
    }

    #[test]
    fn test_residual_matches_smoothing_factor() {
        let (x, y) = sample();
        for s in [0.001, 0.01] {
            let spline = SmoothingSpline::fit(&x, &y, s).unwrap();
            let rss = spline.residual_sum_of_squares(&y);
            assert!((rss - s).abs() < 1e-6, "s = {s}, rss = {rss}");
        }
    }

    #[test]
    fn test_large_smoothing_returns_least_squares_cubic() {
        let (x, y) = sample();
        let spline = SmoothingSpline::fit(&x, &y, 5.0).unwrap();
        // The least-squares line would leave 0.01346
        assert!((spline.residual_sum_of_squares(&y) - 0.010_503).abs() < 1e-5);
        assert!((spline.evaluate(10.0) - 0.605_61).abs() < 1e-4);
        assert!((spline.evaluate(27.5) - 0.481_87).abs() < 1e-4);
        // Outside the knots: linear continuation of the end slope
        assert!((spline.evaluate(7.0) - 0.655_25).abs() < 1e-4);
        assert!((spline.evaluate(49.0) - 0.245_20).abs() < 1e-4);
    }

    #[test]
    fn test_loose_smoothing_keeps_curvature() {
        // U-shaped: 0.65 at both ends, 0.35 in the middle
        let x: Vec<f64> = (10..=48).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|m| 0.35 + 0.3 * ((m - 29.0) / 19.0).powi(2)).collect();

        for s in [1.0, 5.0] {
            let spline = SmoothingSpline::fit(&x, &y, s).unwrap();
            assert!((spline.evaluate(10.0) - 0.65).abs() < 1e-6, "s = {s}");
            assert!((spline.evaluate(29.0) - 0.35).abs() < 1e-6, "s = {s}");
            assert!((spline.evaluate(48.0) - 0.65).abs() < 1e-6, "s = {s}");
            assert!((spline.evaluate(19.5) - 0.425).abs() < 1e-6, "s = {s}");
        }
    }

    #[test]
    fn test_three_points_fit_exactly() {
        let spline = SmoothingSpline::fit(&[1.0, 2.0, 4.0], &[0.2, 0.8, 0.4], 1.0).unwrap();
        assert!(spline.residual_sum_of_squares(&[0.2, 0.8, 0.4]) < 1e-12);
    }

    #[test]
    fn test_rejects_bad_abscissae() {
        assert_eq!(
            SmoothingSpline::fit(&[1.0, 1.0, 2.0], &[0.0, 0.0, 0.0], 1.0),
            Err(StatsError::NonIncreasing)
        );
        assert!(matches!(
            SmoothingSpline::fit(&[1.0, 2.0], &[0.0, 0.0], 1.0),
            Err(StatsError::TooFewPoints { .. })
        ));
    }
}
