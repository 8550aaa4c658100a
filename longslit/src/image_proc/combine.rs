//! Median-stack combination of bias and flat calibration frames.

use std::path::{Path, PathBuf};

use log::debug;
use ndarray::{Array2, Axis};

use crate::error::ReduceError;
use crate::wavecal::ArcParams;

use super::median::median;

/// Fraction of the median row sum a row must reach to count as illuminated.
const ILLUM_THRESH: f64 = 0.8;

/// A frame handed to the combiner: either a path resolved through an
/// [`ImageLoader`], or an array already in memory.
#[derive(Debug, Clone)]
pub enum FrameInput {
    /// Load the frame from a scientific image container.
    Path(PathBuf),
    /// Use the pixel array directly.
    Array(Array2<f64>),
}

/// A frame plus the header-derived dispersion parameters.
#[derive(Debug, Clone)]
pub struct LoadedFrame {
    /// Pixel intensities, rows spatial and columns dispersion, already
    /// trimmed to the header's region of interest when requested.
    pub data: Array2<f64>,
    /// Linear dispersion guess derived from the header.
    pub params: ArcParams,
}

/// External collaborator that reads a scientific image container.
pub trait ImageLoader {
    /// Load the frame at `path`, trimming to the header-declared region of
    /// interest when `trim` is set.
    fn load(&self, path: &Path, trim: bool) -> Result<LoadedFrame, ReduceError>;
}

/// Resolve a list of frame inputs into pixel arrays.
pub fn resolve_frames(
    inputs: Vec<FrameInput>,
    loader: &dyn ImageLoader,
    trim: bool,
) -> Result<Vec<Array2<f64>>, ReduceError> {
    inputs
        .into_iter()
        .map(|input| match input {
            FrameInput::Array(data) => Ok(data),
            FrameInput::Path(path) => loader.load(&path, trim).map(|frame| frame.data),
        })
        .collect()
}

/// Per-pixel median across a stack of same-shaped frames.
pub fn median_stack(frames: &[Array2<f64>]) -> Result<Array2<f64>, ReduceError> {
    let first = frames.first().ok_or(ReduceError::EmptyFrameStack)?;
    let (rows, cols) = first.dim();

    for (index, frame) in frames.iter().enumerate() {
        let (got_rows, got_cols) = frame.dim();
        if (got_rows, got_cols) != (rows, cols) {
            return Err(ReduceError::FrameShapeMismatch {
                index,
                got_rows,
                got_cols,
                rows,
                cols,
            });
        }
    }

    let mut stack = Vec::with_capacity(frames.len());
    let mut out = Array2::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            stack.clear();
            stack.extend(frames.iter().map(|f| f[[r, c]]));
            out[[r, c]] = median(&stack);
        }
    }

    Ok(out)
}

/// Combine bias frames by median stacking.
pub fn combine_bias(frames: &[Array2<f64>]) -> Result<Array2<f64>, ReduceError> {
    debug!("combining {} bias frames", frames.len());
    median_stack(frames)
}

/// Combine flat frames: subtract the bias, scale each frame by its median
/// over adequately illuminated rows, and median-stack.
///
/// Returns the combined flat and the boolean row mask of adequately
/// illuminated rows, derived from the combined flat with the same
/// threshold used for scaling.
pub fn combine_flat(
    frames: &[Array2<f64>],
    bias: &Array2<f64>,
) -> Result<(Array2<f64>, Vec<bool>), ReduceError> {
    if frames.is_empty() {
        return Err(ReduceError::EmptyFrameStack);
    }

    let (rows, cols) = bias.dim();
    let mut debiased = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let (got_rows, got_cols) = frame.dim();
        if (got_rows, got_cols) != (rows, cols) {
            return Err(ReduceError::FrameShapeMismatch {
                index,
                got_rows,
                got_cols,
                rows,
                cols,
            });
        }

        let d = frame - bias;
        let mask = illuminated_rows(&d);

        // Median scaling over illuminated rows absorbs exposure-time
        // differences between flats.
        let lit: Vec<f64> = d
            .axis_iter(Axis(0))
            .zip(mask.iter())
            .filter(|(_, &ok)| ok)
            .flat_map(|(row, _)| row.to_vec())
            .collect();
        let scale = if lit.is_empty() { 1.0 } else { median(&lit) };
        debug!("flat frame {index}: scale {scale:.3}");

        debiased.push(d.mapv(|v| v / scale));
    }

    let flat = median_stack(&debiased)?;
    let mask = illuminated_rows(&flat);
    Ok((flat, mask))
}

/// Rows whose summed flux reaches [`ILLUM_THRESH`] of the median row sum.
fn illuminated_rows(frame: &Array2<f64>) -> Vec<bool> {
    let row_sums: Vec<f64> = frame
        .axis_iter(Axis(0))
        .map(|row| row.sum())
        .collect();
    let cutoff = median(&row_sums) * ILLUM_THRESH;
    row_sums.iter().map(|&s| s >= cutoff).collect()
}
