use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the reduction pipeline.
#[derive(Error, Debug)]
pub enum ReduceError {
    /// A nonlinear profile fit did not converge, or had fewer samples than
    /// free parameters.
    #[error("fit did not converge")]
    FitDidNotConverge,

    /// Too few valid window centers to build the trace spline.
    #[error("insufficient trace points: {got} valid window centers, need {needed}")]
    InsufficientTracePoints {
        /// Valid window centers obtained.
        got: usize,
        /// Minimum required for the spline.
        needed: usize,
    },

    /// Too few points for a polynomial or spline fit.
    #[error("insufficient data: {got} points for {unknowns} unknowns")]
    InsufficientData {
        /// Points supplied.
        got: usize,
        /// Coefficients to solve for.
        unknowns: usize,
    },

    /// The least-squares system was singular.
    #[error("degenerate least-squares system")]
    SingularSystem,

    /// No arc-lamp peaks rose above the detection threshold.
    #[error("no calibration lines detected")]
    NoCalibrationLines,

    /// No detected peak matched a line-list entry within tolerance.
    #[error("no arc lines matched within tolerance")]
    NoMatchedLines,

    /// Too few (x, y, wavelength) samples to fit the wavelength surface.
    #[error("insufficient calibration samples: {got}, need {needed}")]
    InsufficientCalibrationSamples {
        /// Samples accumulated from vertical line tracing.
        got: usize,
        /// Minimum required by the surface basis.
        needed: usize,
    },

    /// A sky band extends past the spatial extent of the image.
    #[error("sky band rows {lo}..{hi} fall outside image of {rows} rows (column {column})")]
    SkyBandOutOfBounds {
        /// First requested row (may be negative).
        lo: i64,
        /// One past the last requested row.
        hi: i64,
        /// Spatial extent of the image.
        rows: usize,
        /// Dispersion column being fit.
        column: usize,
    },

    /// Trace length does not match the image column count.
    #[error("trace has {trace} entries, image has {cols} columns")]
    TraceLengthMismatch {
        /// Trace entries supplied.
        trace: usize,
        /// Image dispersion columns.
        cols: usize,
    },

    /// The line list contained no usable wavelengths.
    #[error("line list is empty")]
    EmptyLineList,

    /// Line-list file could not be read.
    #[error("failed to read line list {path}: {source}")]
    LineListIo {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Line-list entry could not be parsed as a wavelength.
    #[error("line list {path}, line {line}: {value:?} is not a wavelength")]
    LineListParse {
        /// Path being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Offending token.
        value: String,
    },

    /// An external image loader failed to produce a frame.
    #[error("failed to load frame {path}: {message}")]
    FrameLoad {
        /// Path that failed to load.
        path: PathBuf,
        /// Loader-specific description.
        message: String,
    },

    /// A frame stack to combine was empty.
    #[error("no frames supplied to combine")]
    EmptyFrameStack,

    /// Frames in a combination stack disagree on shape.
    #[error("frame {index} is {got_rows}x{got_cols}, expected {rows}x{cols}")]
    FrameShapeMismatch {
        /// Index of the offending frame.
        index: usize,
        /// Rows of the offending frame.
        got_rows: usize,
        /// Columns of the offending frame.
        got_cols: usize,
        /// Expected rows.
        rows: usize,
        /// Expected columns.
        cols: usize,
    },
}
