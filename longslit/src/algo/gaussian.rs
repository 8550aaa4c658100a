//! Gaussian-plus-offset profile fitting.
//!
//! The workhorse fit of the pipeline: trace windows, arc-line centers, and
//! vertical line tracing all reduce to locating the sub-pixel center of a
//! `a * exp(-(x - x0)^2 / (2 w^2)) + b` profile.

use crate::error::ReduceError;

use super::lm::{optimize, LmConfig, Model1d};

/// Parameters of a Gaussian-plus-offset profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianProfile {
    /// Peak amplitude above the baseline.
    pub amplitude: f64,
    /// Constant baseline offset.
    pub baseline: f64,
    /// Profile center in the independent variable's units.
    pub center: f64,
    /// Gaussian width (sigma).
    pub width: f64,
}

impl GaussianProfile {
    /// Evaluate the profile at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let d = x - self.center;
        self.amplitude * (-d * d / (2.0 * self.width * self.width)).exp() + self.baseline
    }

    fn to_params(self) -> [f64; 4] {
        [self.amplitude, self.baseline, self.center, self.width]
    }

    fn from_params(params: [f64; 4]) -> Self {
        Self {
            amplitude: params[0],
            baseline: params[1],
            center: params[2],
            width: params[3],
        }
    }
}

struct GaussianModel;

impl Model1d<4> for GaussianModel {
    fn evaluate(&self, x: f64, params: &[f64; 4]) -> f64 {
        let [a, b, x0, w] = *params;
        let d = x - x0;
        a * (-d * d / (2.0 * w * w)).exp() + b
    }

    fn jacobian_row(&self, x: f64, params: &[f64; 4]) -> [f64; 4] {
        let [a, _b, x0, w] = *params;
        let d = x - x0;
        let e = (-d * d / (2.0 * w * w)).exp();
        [e, 1.0, a * e * d / (w * w), a * e * d * d / (w * w * w)]
    }

    fn constrain(&self, params: &mut [f64; 4]) {
        // Width sign is degenerate; keep it positive and bounded away from zero.
        params[3] = params[3].abs().max(1e-6);
    }
}

/// Fit a Gaussian-plus-offset profile to `(x, y)` samples.
///
/// `x` and `y` must have the same length. Fails with
/// [`ReduceError::FitDidNotConverge`] when fewer than four samples are
/// supplied or the optimizer exhausts its iteration budget without
/// converging; the same inputs and guess always produce the same result.
pub fn fit_gaussian(
    x: &[f64],
    y: &[f64],
    guess: GaussianProfile,
    config: &LmConfig,
) -> Result<GaussianProfile, ReduceError> {
    assert_eq!(x.len(), y.len(), "sample arrays must have the same length");

    if x.len() < 4 {
        return Err(ReduceError::FitDidNotConverge);
    }

    let result = optimize(&GaussianModel, x, y, guess.to_params(), config);
    if !result.converged || result.params.iter().any(|p| !p.is_finite()) {
        return Err(ReduceError::FitDidNotConverge);
    }

    Ok(GaussianProfile::from_params(result.params))
}
