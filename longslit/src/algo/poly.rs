//! Least-squares polynomial fitting about a fixed center.

use crate::error::ReduceError;

use super::solve::lstsq;

/// Polynomial in `(x - center)`, coefficients lowest order first.
///
/// Centering keeps the normal equations well conditioned when the abscissa
/// is a pixel index running into the hundreds.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    center: f64,
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Build a polynomial from known coefficients about `center`.
    ///
    /// # Panics
    /// If `coeffs` is empty.
    pub fn new(center: f64, coeffs: Vec<f64>) -> Self {
        assert!(!coeffs.is_empty(), "polynomial needs at least one coefficient");
        Self { center, coeffs }
    }

    /// Least-squares fit of a degree-`degree` polynomial through `(x, y)`.
    ///
    /// The fit is centered at the mean of `x`. Fails when fewer than
    /// `degree + 1` samples are supplied or the system is degenerate.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self, ReduceError> {
        assert_eq!(x.len(), y.len(), "sample arrays must have the same length");

        let unknowns = degree + 1;
        if x.len() < unknowns {
            return Err(ReduceError::InsufficientData {
                got: x.len(),
                unknowns,
            });
        }

        let center = x.iter().sum::<f64>() / x.len() as f64;
        let design: Vec<Vec<f64>> = x
            .iter()
            .map(|&xi| {
                let t = xi - center;
                let mut row = Vec::with_capacity(unknowns);
                let mut p = 1.0;
                for _ in 0..unknowns {
                    row.push(p);
                    p *= t;
                }
                row
            })
            .collect();

        let coeffs = lstsq(&design, y)?;
        Ok(Self { center, coeffs })
    }

    /// Evaluate at `x` by Horner's rule.
    pub fn eval(&self, x: f64) -> f64 {
        let t = x - self.center;
        self.coeffs
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }

    /// Degree of the polynomial.
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_recovers_quadratic() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 0.5 * xi * xi - 3.0 * xi + 7.0).collect();

        let p = Polynomial::fit(&x, &y, 2).unwrap();
        for &xi in &[0.0, 4.5, 13.0, 19.0] {
            let expected = 0.5 * xi * xi - 3.0 * xi + 7.0;
            assert_relative_eq!(p.eval(xi), expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_fit_constant() {
        let x = vec![10.0, 20.0, 30.0];
        let y = vec![5.0, 5.0, 5.0];
        let p = Polynomial::fit(&x, &y, 0).unwrap();
        assert_relative_eq!(p.eval(-100.0), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_large_offset_pixels() {
        // Uncentered normal equations would struggle here.
        let x: Vec<f64> = (900..1000).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 2.0 * xi + 1.0).collect();
        let p = Polynomial::fit(&x, &y, 3).unwrap();
        assert_relative_eq!(p.eval(950.0), 1901.0, epsilon = 1e-6);
    }

    #[test]
    fn test_too_few_points() {
        let x = vec![1.0, 2.0];
        let y = vec![1.0, 2.0];
        assert!(matches!(
            Polynomial::fit(&x, &y, 2),
            Err(ReduceError::InsufficientData { got: 2, unknowns: 3 })
        ));
    }

    #[test]
    fn test_eval_seeded_linear() {
        // Seed polynomial convention: linear guess about a fixed center.
        let p = Polynomial::new(100.0, vec![5000.0, 2.0]);
        assert_relative_eq!(p.eval(100.0), 5000.0);
        assert_relative_eq!(p.eval(110.0), 5020.0);
        assert_relative_eq!(p.eval(90.0), 4980.0);
    }
}
