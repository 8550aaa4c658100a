//! Numerical fitting primitives shared across the reduction pipeline.
//!
//! Everything here operates on plain `f64` slices: a Levenberg-Marquardt
//! optimizer for small nonlinear models, least-squares polynomial and
//! spline fits for smooth curves, and a bivariate surface fit for the
//! wavelength solution.

pub mod gaussian;
pub mod lm;
pub mod poly;
pub mod spline;
pub mod surface;

mod solve;

pub use gaussian::{fit_gaussian, GaussianProfile};
pub use lm::{LmConfig, LmResult};
pub use poly::Polynomial;
pub use spline::SmoothingSpline;
pub use surface::BivariateSurface;
