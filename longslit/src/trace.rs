//! Aperture trace finding.
//!
//! Locates the sub-pixel spatial position of the source in windowed slices
//! along the dispersion axis, then smooths the window centers into one
//! trace value per column.

use log::debug;
use ndarray::ArrayView2;

use crate::algo::{fit_gaussian, GaussianProfile, LmConfig, SmoothingSpline};
use crate::config::TraceConfig;
use crate::error::ReduceError;
use crate::image_proc::{median, median_filter};

/// Fewest valid window centers the trace spline can be built from.
const MIN_TRACE_POINTS: usize = 4;

/// Trace the spatial position of the source across the dispersion axis.
///
/// Median pre-filters the image, splits the dispersion axis into
/// `nsteps - 1` column windows, fits a Gaussian spatial profile per window,
/// and runs a cubic smoothing spline through the window centers. Returns
/// one sub-pixel row position per image column.
///
/// Windows whose profile fit does not converge are dropped; fewer than four
/// surviving centers fail with
/// [`ReduceError::InsufficientTracePoints`].
pub fn trace_aperture(
    image: ArrayView2<f64>,
    config: &TraceConfig,
) -> Result<Vec<f64>, ReduceError> {
    assert!(config.nsteps >= 2, "need at least one trace window");

    let (rows, cols) = image.dim();
    let smoothed = median_filter(image, config.median_window);
    let fit_config = LmConfig::default();

    // Bin edges spanning the dispersion axis.
    let edge = |k: usize| cols as f64 * k as f64 / (config.nsteps - 1) as f64;

    let mut midpoints = Vec::with_capacity(config.nsteps - 1);
    let mut centers = Vec::with_capacity(config.nsteps - 1);
    let mut profile = vec![0.0; rows];
    let spatial: Vec<f64> = (0..rows).map(|r| r as f64).collect();

    for k in 0..config.nsteps - 1 {
        let c0 = edge(k) as usize;
        let c1 = (edge(k + 1) as usize).min(cols);
        if c1 <= c0 {
            continue;
        }

        // Collapse the window to a spatial profile.
        for (r, p) in profile.iter_mut().enumerate() {
            *p = (c0..c1).map(|c| smoothed[[r, c]]).sum();
        }

        let peak_row = profile
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).expect("non-finite profile"))
            .map(|(r, _)| r)
            .unwrap_or(0);
        let guess = GaussianProfile {
            amplitude: profile[peak_row],
            baseline: median(&profile),
            center: peak_row as f64,
            width: 2.0,
        };

        match fit_gaussian(&spatial, &profile, guess, &fit_config) {
            Ok(fit) if fit.amplitude > 0.0 && fit.center >= 0.0 && fit.center < rows as f64 => {
                midpoints.push((edge(k) + edge(k + 1)) / 2.0);
                centers.push(fit.center);
            }
            Ok(fit) => {
                debug!(
                    "trace window {c0}..{c1} degenerate (center {:.1}, amplitude {:.1})",
                    fit.center, fit.amplitude
                );
            }
            Err(e) => {
                debug!("trace window {c0}..{c1} dropped: {e}");
            }
        }
    }

    if centers.len() < MIN_TRACE_POINTS {
        return Err(ReduceError::InsufficientTracePoints {
            got: centers.len(),
            needed: MIN_TRACE_POINTS,
        });
    }
    debug!(
        "trace built from {} of {} windows",
        centers.len(),
        config.nsteps - 1
    );

    let spline = SmoothingSpline::fit(&midpoints, &centers)?;
    Ok((0..cols).map(|c| spline.eval(c as f64)).collect())
}
