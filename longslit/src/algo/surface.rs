//! Smooth bivariate surface fit for the 2-D wavelength solution.

use crate::error::ReduceError;

use super::solve::lstsq;

/// Polynomial degree in each axis.
const DEGREE: usize = 3;

/// Smooth surface `w(x, y)`, cubic in each axis, least-squares fit to a
/// scattered sample cloud.
///
/// Basis coordinates are normalized to the bounding box supplied at fit
/// time (the full detector extent), which keeps the normal equations well
/// conditioned and makes extrapolation just past the box benign.
#[derive(Debug, Clone)]
pub struct BivariateSurface {
    /// Coefficients for `u^i * v^j`, `j` fastest.
    coeffs: Vec<f64>,
    x_bounds: (f64, f64),
    y_bounds: (f64, f64),
}

impl BivariateSurface {
    /// Samples needed to determine the tensor-product cubic basis.
    pub const MIN_SAMPLES: usize = (DEGREE + 1) * (DEGREE + 1);

    /// Fit the surface to `(x, y, w)` samples over the given bounding box.
    ///
    /// Fails when fewer than [`Self::MIN_SAMPLES`] samples are supplied or
    /// the sample geometry leaves the system degenerate.
    pub fn fit(
        samples: &[(f64, f64, f64)],
        x_bounds: (f64, f64),
        y_bounds: (f64, f64),
    ) -> Result<Self, ReduceError> {
        if samples.len() < Self::MIN_SAMPLES {
            return Err(ReduceError::InsufficientData {
                got: samples.len(),
                unknowns: Self::MIN_SAMPLES,
            });
        }

        let design: Vec<Vec<f64>> = samples
            .iter()
            .map(|&(x, y, _)| {
                basis_row(
                    normalize(x, x_bounds),
                    normalize(y, y_bounds),
                )
            })
            .collect();
        let rhs: Vec<f64> = samples.iter().map(|&(_, _, w)| w).collect();

        let coeffs = lstsq(&design, &rhs)?;
        Ok(Self {
            coeffs,
            x_bounds,
            y_bounds,
        })
    }

    /// Evaluate the surface at `(x, y)`.
    ///
    /// Points outside the fit bounding box extrapolate; accuracy there is
    /// not guaranteed.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let row = basis_row(
            normalize(x, self.x_bounds),
            normalize(y, self.y_bounds),
        );
        row.iter()
            .zip(self.coeffs.iter())
            .map(|(b, c)| b * c)
            .sum()
    }
}

fn normalize(x: f64, (lo, hi): (f64, f64)) -> f64 {
    2.0 * (x - lo) / (hi - lo) - 1.0
}

fn basis_row(u: f64, v: f64) -> Vec<f64> {
    let mut u_pow = [1.0; DEGREE + 1];
    let mut v_pow = [1.0; DEGREE + 1];
    for i in 1..=DEGREE {
        u_pow[i] = u_pow[i - 1] * u;
        v_pow[i] = v_pow[i - 1] * v;
    }

    let mut row = Vec::with_capacity((DEGREE + 1) * (DEGREE + 1));
    for &up in &u_pow {
        for &vp in &v_pow {
            row.push(up * vp);
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_samples<F: Fn(f64, f64) -> f64>(f: F) -> Vec<(f64, f64, f64)> {
        let mut samples = Vec::new();
        for xi in (0..100).step_by(10) {
            for yi in (0..60).step_by(6) {
                let (x, y) = (xi as f64, yi as f64);
                samples.push((x, y, f(x, y)));
            }
        }
        samples
    }

    #[test]
    fn test_recovers_plane() {
        let samples = grid_samples(|x, y| 2.0 * x + 3.0 * y + 5.0);
        let surface = BivariateSurface::fit(&samples, (0.0, 100.0), (0.0, 60.0)).unwrap();

        assert_relative_eq!(surface.eval(50.0, 30.0), 195.0, epsilon = 1e-6);
        assert_relative_eq!(surface.eval(12.0, 48.0), 173.0, epsilon = 1e-6);
    }

    #[test]
    fn test_recovers_cubic_in_x() {
        let samples = grid_samples(|x, _| 1e-4 * x * x * x - 0.02 * x * x + x + 4000.0);
        let surface = BivariateSurface::fit(&samples, (0.0, 100.0), (0.0, 60.0)).unwrap();

        let expect = |x: f64| 1e-4 * x * x * x - 0.02 * x * x + x + 4000.0;
        for &x in &[5.0, 33.0, 71.0, 95.0] {
            assert_relative_eq!(surface.eval(x, 30.0), expect(x), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_too_few_samples() {
        let samples = vec![(0.0, 0.0, 1.0); 10];
        assert!(matches!(
            BivariateSurface::fit(&samples, (0.0, 1.0), (0.0, 1.0)),
            Err(ReduceError::InsufficientData { got: 10, .. })
        ));
    }
}
