//! Levenberg-Marquardt optimizer for small 1-D profile models.

use super::solve::solve_dense;

/// Configuration for Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum iterations.
    pub max_iterations: usize,
    /// Convergence threshold for parameter changes.
    pub convergence_threshold: f64,
    /// Initial damping parameter.
    pub initial_lambda: f64,
    /// Factor to increase lambda on a failed step.
    pub lambda_up: f64,
    /// Factor to decrease lambda on a successful step.
    pub lambda_down: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            convergence_threshold: 1e-8,
            initial_lambda: 0.001,
            lambda_up: 10.0,
            lambda_down: 0.1,
        }
    }
}

/// Result of an L-M optimization.
#[derive(Debug, Clone, Copy)]
pub struct LmResult<const N: usize> {
    /// Best parameters found.
    pub params: [f64; N],
    /// Sum of squared residuals at `params`.
    pub chi2: f64,
    /// Whether the parameter step fell below the convergence threshold.
    pub converged: bool,
    /// Iterations executed.
    pub iterations: usize,
}

/// A model of one independent variable that can be fit with L-M.
pub trait Model1d<const N: usize> {
    /// Evaluate the model at `x`.
    fn evaluate(&self, x: f64, params: &[f64; N]) -> f64;

    /// Partial derivatives of the model at `x`.
    fn jacobian_row(&self, x: f64, params: &[f64; N]) -> [f64; N];

    /// Apply parameter constraints after an update.
    fn constrain(&self, _params: &mut [f64; N]) {}
}

/// Run L-M optimization of an N-parameter model over `(x, y)` samples.
pub fn optimize<const N: usize, M: Model1d<N>>(
    model: &M,
    x: &[f64],
    y: &[f64],
    initial_params: [f64; N],
    config: &LmConfig,
) -> LmResult<N> {
    assert_eq!(x.len(), y.len(), "sample arrays must have the same length");

    let mut params = initial_params;
    let mut lambda = config.initial_lambda;
    let mut prev_chi2 = compute_chi2(model, x, y, &params);
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..config.max_iterations {
        iterations = iter + 1;

        let (hessian, gradient) = hessian_gradient(model, x, y, &params);

        let mut damped: Vec<Vec<f64>> = hessian.iter().map(|row| row.to_vec()).collect();
        for (i, row) in damped.iter_mut().enumerate() {
            row[i] *= 1.0 + lambda;
        }

        let Some(delta) = solve_dense(damped, gradient.to_vec()) else {
            break;
        };

        let mut new_params = params;
        for (p, d) in new_params.iter_mut().zip(delta.iter()) {
            *p += d;
        }
        model.constrain(&mut new_params);

        let new_chi2 = compute_chi2(model, x, y, &new_params);

        if new_chi2 < prev_chi2 {
            params = new_params;
            lambda *= config.lambda_down;
            prev_chi2 = new_chi2;

            let max_delta = delta.iter().copied().fold(0.0f64, |a, d| a.max(d.abs()));
            if max_delta < config.convergence_threshold {
                converged = true;
                break;
            }
        } else if new_chi2 == prev_chi2 {
            // Flat step from an already-exact fit.
            converged = true;
            break;
        } else {
            lambda *= config.lambda_up;
            if lambda > 1e10 {
                break;
            }
        }
    }

    LmResult {
        params,
        chi2: prev_chi2,
        converged,
        iterations,
    }
}

fn compute_chi2<const N: usize, M: Model1d<N>>(
    model: &M,
    x: &[f64],
    y: &[f64],
    params: &[f64; N],
) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            let r = yi - model.evaluate(xi, params);
            r * r
        })
        .sum()
}

/// Accumulate J^T J and J^T r without materializing the Jacobian.
fn hessian_gradient<const N: usize, M: Model1d<N>>(
    model: &M,
    x: &[f64],
    y: &[f64],
    params: &[f64; N],
) -> ([[f64; N]; N], [f64; N]) {
    let mut hessian = [[0.0f64; N]; N];
    let mut gradient = [0.0f64; N];

    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let row = model.jacobian_row(xi, params);
        let r = yi - model.evaluate(xi, params);
        for i in 0..N {
            gradient[i] += row[i] * r;
            for j in i..N {
                hessian[i][j] += row[i] * row[j];
            }
        }
    }

    for i in 1..N {
        for j in 0..i {
            hessian[i][j] = hessian[j][i];
        }
    }

    (hessian, gradient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// y = a * x + b
    struct Line;

    impl Model1d<2> for Line {
        fn evaluate(&self, x: f64, params: &[f64; 2]) -> f64 {
            params[0] * x + params[1]
        }

        fn jacobian_row(&self, x: f64, _params: &[f64; 2]) -> [f64; 2] {
            [x, 1.0]
        }
    }

    #[test]
    fn test_fit_line() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 3.0 * xi - 7.0).collect();

        let result = optimize(&Line, &x, &y, [1.0, 0.0], &LmConfig::default());
        assert!(result.converged);
        assert_relative_eq!(result.params[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(result.params[1], -7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_exact_initial_guess_converges() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 2.0 * xi + 1.0).collect();

        let result = optimize(&Line, &x, &y, [2.0, 1.0], &LmConfig::default());
        assert!(result.converged);
        assert!(result.chi2 < 1e-12);
    }
}
