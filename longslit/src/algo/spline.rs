//! Least-squares cubic smoothing spline.
//!
//! Fits a cubic curve with a small number of interior knots through noisy
//! samples. Unlike an interpolating spline it is not forced through every
//! point, which is what the trace finder needs: individual window centers
//! carry fit noise that must not wiggle the trace. Outside the sample
//! domain the end segments extrapolate naturally.

use crate::error::ReduceError;

use super::solve::lstsq;

/// Most interior knots a fit will use.
const MAX_KNOTS: usize = 8;

/// Cubic smoothing spline over scattered `(x, y)` samples.
#[derive(Debug, Clone)]
pub struct SmoothingSpline {
    /// Interior knots in normalized coordinates.
    knots: Vec<f64>,
    /// Coefficients: cubic terms first, then one per knot.
    coeffs: Vec<f64>,
    x_min: f64,
    x_span: f64,
}

impl SmoothingSpline {
    /// Fit a smoothing spline through `(x, y)`.
    ///
    /// `x` must be strictly ascending. The knot count scales with the
    /// sample count (one per ten samples, capped), so sparse inputs reduce
    /// to a plain cubic. Fails when fewer than four samples are supplied.
    ///
    /// # Panics
    /// If `x` and `y` differ in length or `x` is not strictly ascending.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, ReduceError> {
        assert_eq!(x.len(), y.len(), "sample arrays must have the same length");
        for i in 1..x.len() {
            assert!(x[i] > x[i - 1], "x values must be strictly ascending");
        }

        let n = x.len();
        if n < 4 {
            return Err(ReduceError::InsufficientData {
                got: n,
                unknowns: 4,
            });
        }

        let x_min = x[0];
        let x_span = x[n - 1] - x[0];

        let n_knots = (n / 10).min(MAX_KNOTS).min(n - 4);
        let knots: Vec<f64> = (1..=n_knots)
            .map(|j| j as f64 / (n_knots + 1) as f64)
            .collect();

        let design: Vec<Vec<f64>> = x
            .iter()
            .map(|&xi| basis_row(normalize(xi, x_min, x_span), &knots))
            .collect();
        let coeffs = lstsq(&design, y)?;

        Ok(Self {
            knots,
            coeffs,
            x_min,
            x_span,
        })
    }

    /// Evaluate the spline at `x`, extrapolating beyond the fit domain.
    pub fn eval(&self, x: f64) -> f64 {
        let row = basis_row(normalize(x, self.x_min, self.x_span), &self.knots);
        row.iter()
            .zip(self.coeffs.iter())
            .map(|(b, c)| b * c)
            .sum()
    }
}

fn normalize(x: f64, x_min: f64, x_span: f64) -> f64 {
    (x - x_min) / x_span
}

/// Truncated power basis: 1, t, t^2, t^3, (t - k_j)^3 for t > k_j.
fn basis_row(t: f64, knots: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(4 + knots.len());
    row.push(1.0);
    row.push(t);
    row.push(t * t);
    row.push(t * t * t);
    for &k in knots {
        let d = t - k;
        row.push(if d > 0.0 { d * d * d } else { 0.0 });
    }
    row
}
