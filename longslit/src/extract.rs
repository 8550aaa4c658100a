//! Aperture flux extraction.

use ndarray::ArrayView2;

use crate::config::ExtractConfig;
use crate::error::ReduceError;

/// Sum flux in a band around the trace, one value per dispersion column.
///
/// The summation window covers rows `[trace - width_down, trace + width_up)`
/// where both half-widths start at the configured aperture half-width and
/// are clamped to stay at least one pixel inside the image, never going
/// negative. A trace that sits outside the image entirely is a caller
/// error the trace finder is expected to have prevented.
pub fn extract_aperture(
    image: ArrayView2<f64>,
    trace: &[f64],
    config: &ExtractConfig,
) -> Result<Vec<f64>, ReduceError> {
    let (rows, cols) = image.dim();
    if trace.len() != cols {
        return Err(ReduceError::TraceLengthMismatch {
            trace: trace.len(),
            cols,
        });
    }

    let nrows = rows as f64;
    let mut spectrum = Vec::with_capacity(cols);

    for (i, &t) in trace.iter().enumerate() {
        let mut width_up = config.apwidth;
        let mut width_down = config.apwidth;

        if t + width_up > nrows {
            width_up = (nrows - t - 1.0).max(0.0);
        }
        if t - width_down < 0.0 {
            width_down = (t - 1.0).max(0.0);
        }

        let lo = (t - width_down).max(0.0) as usize;
        let hi = ((t + width_up).max(0.0) as usize).min(rows);

        let sum: f64 = (lo..hi).map(|r| image[[r, i]]).sum();
        spectrum.push(sum);
    }

    Ok(spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_unit_image_sums_to_window_height() {
        let image = Array2::from_elem((60, 20), 1.0);
        let trace = vec![30.0; 20];
        let config = ExtractConfig { apwidth: 5.0 };

        let spectrum = extract_aperture(image.view(), &trace, &config).unwrap();
        for &v in &spectrum {
            assert_relative_eq!(v, 10.0);
        }
    }

    #[test]
    fn test_clamps_near_edge() {
        let image = Array2::from_elem((60, 4), 1.0);
        let trace = vec![2.0; 4];
        let config = ExtractConfig { apwidth: 5.0 };

        let spectrum = extract_aperture(image.view(), &trace, &config).unwrap();
        // Rows 0..7: half-width below clamps to trace - 1 = 1.
        for &v in &spectrum {
            assert_relative_eq!(v, 6.0);
        }
    }

    #[test]
    fn test_clamps_at_upper_edge() {
        let image = Array2::from_elem((60, 4), 1.0);
        let trace = vec![58.0; 4];
        let config = ExtractConfig { apwidth: 5.0 };

        let spectrum = extract_aperture(image.view(), &trace, &config).unwrap();
        // Rows 53..59: upper half-width clamps to rows - trace - 1 = 1.
        for &v in &spectrum {
            assert_relative_eq!(v, 6.0);
        }
    }

    #[test]
    fn test_idempotent() {
        let mut image = Array2::from_elem((40, 10), 2.0);
        image[[20, 3]] = 50.0;
        let trace = vec![20.0; 10];
        let config = ExtractConfig::default();

        let a = extract_aperture(image.view(), &trace, &config).unwrap();
        let b = extract_aperture(image.view(), &trace, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_trace_length_mismatch() {
        let image = Array2::zeros((10, 10));
        let trace = vec![5.0; 7];
        assert!(matches!(
            extract_aperture(image.view(), &trace, &ExtractConfig::default()),
            Err(ReduceError::TraceLengthMismatch { trace: 7, cols: 10 })
        ));
    }
}
