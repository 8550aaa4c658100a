//! Per-column sky background estimation.

use ndarray::ArrayView2;

use crate::algo::Polynomial;
use crate::config::SkyConfig;
use crate::error::ReduceError;

/// Estimate the sky contribution under the aperture, one value per column.
///
/// For each column, intensities are sampled in two bands flanking the
/// trace (separated from it by `separation` rows, each `band_width` rows
/// tall), a degree-`degree` polynomial is fit through (row, intensity),
/// and the polynomial is summed over the `2 * apwidth` integer-spaced rows
/// of the aperture. The result shares units with the extracted flux and is
/// subtracted from it directly.
///
/// Sky bands that would extend past the spatial extent of the image fail
/// with [`ReduceError::SkyBandOutOfBounds`]; keep the trace at least
/// `separation + band_width` rows inside the detector.
pub fn fit_sky(
    image: ArrayView2<f64>,
    trace: &[f64],
    config: &SkyConfig,
) -> Result<Vec<f64>, ReduceError> {
    let (rows, cols) = image.dim();
    if trace.len() != cols {
        return Err(ReduceError::TraceLengthMismatch {
            trace: trace.len(),
            cols,
        });
    }

    let sep = config.separation as i64;
    let width = config.band_width as i64;
    let mut sky = Vec::with_capacity(cols);
    let mut band_rows = Vec::with_capacity(2 * config.band_width);
    let mut band_flux = Vec::with_capacity(2 * config.band_width);

    for (i, &t) in trace.iter().enumerate() {
        let itrace = t as i64;
        let lo = itrace - sep - width;
        let hi = itrace + sep + width;
        if lo < 0 || hi > rows as i64 {
            return Err(ReduceError::SkyBandOutOfBounds {
                lo,
                hi,
                rows,
                column: i,
            });
        }

        band_rows.clear();
        band_flux.clear();
        for r in (lo..itrace - sep).chain(itrace + sep..hi) {
            band_rows.push(r as f64);
            band_flux.push(image[[r as usize, i]]);
        }

        let fit = Polynomial::fit(&band_rows, &band_flux, config.degree)?;

        // Sum the fitted background over the aperture rows.
        let start = t - config.apwidth;
        let steps = (2.0 * config.apwidth) as usize;
        let estimate: f64 = (0..steps).map(|j| fit.eval(start + j as f64)).sum();
        sky.push(estimate);
    }

    Ok(sky)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn sky_config() -> SkyConfig {
        SkyConfig {
            apwidth: 5.0,
            separation: 10,
            band_width: 15,
            degree: 2,
        }
    }

    #[test]
    fn test_constant_sky_recovered() {
        // Sky of 5.0 everywhere, bright source confined to the trace row.
        let mut image = Array2::from_elem((80, 12), 5.0);
        for c in 0..12 {
            image[[40, c]] = 500.0;
        }
        let trace = vec![40.0; 12];

        let sky = fit_sky(image.view(), &trace, &sky_config()).unwrap();
        for &v in &sky {
            assert_relative_eq!(v, 5.0 * 2.0 * 5.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_linear_gradient_sky() {
        // Sky varies linearly with row; the degree-2 fit tracks it.
        let mut image = Array2::zeros((100, 6));
        for r in 0..100 {
            for c in 0..6 {
                image[[r, c]] = 2.0 + 0.1 * r as f64;
            }
        }
        let trace = vec![50.0; 6];

        let sky = fit_sky(image.view(), &trace, &sky_config()).unwrap();
        // Aperture rows 45..55 sum of 2 + 0.1*r.
        let expected: f64 = (0..10).map(|j| 2.0 + 0.1 * (45.0 + j as f64)).sum();
        for &v in &sky {
            assert_relative_eq!(v, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_band_out_of_bounds_fails() {
        let image = Array2::from_elem((40, 4), 5.0);
        let trace = vec![10.0; 4];

        let result = fit_sky(image.view(), &trace, &sky_config());
        assert!(matches!(
            result,
            Err(ReduceError::SkyBandOutOfBounds { column: 0, .. })
        ));
    }

    #[test]
    fn test_trace_length_mismatch() {
        let image = Array2::zeros((80, 10));
        let trace = vec![40.0; 3];
        assert!(matches!(
            fit_sky(image.view(), &trace, &sky_config()),
            Err(ReduceError::TraceLengthMismatch { .. })
        ));
    }
}
