//! Median statistics and median filtering.

use ndarray::{Array2, ArrayView2};

/// Median of a slice of samples.
///
/// Averages the two central elements for even-length input.
///
/// # Panics
/// If `values` is empty.
pub fn median(values: &[f64]) -> f64 {
    assert!(!values.is_empty(), "median of empty slice");

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("non-finite sample"));

    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// 2-D median filter with a square window.
///
/// The window shrinks at the image borders rather than padding. Suppresses
/// isolated outliers (cosmic-ray hits) while leaving smooth profiles
/// unchanged.
///
/// # Panics
/// If `size` is even or zero.
pub fn median_filter(image: ArrayView2<f64>, size: usize) -> Array2<f64> {
    assert!(size % 2 == 1, "median filter window must be odd");

    let (rows, cols) = image.dim();
    let half = size / 2;
    let mut out = Array2::zeros((rows, cols));
    let mut window = Vec::with_capacity(size * size);

    for r in 0..rows {
        let r0 = r.saturating_sub(half);
        let r1 = (r + half + 1).min(rows);
        for c in 0..cols {
            let c0 = c.saturating_sub(half);
            let c1 = (c + half + 1).min(cols);

            window.clear();
            for rr in r0..r1 {
                for cc in c0..c1 {
                    window.push(image[[rr, cc]]);
                }
            }
            out[[r, c]] = median(&window);
        }
    }

    out
}
