//! Image processing for spectral reduction frames.
//!
//! Median filtering and pre-filtering used by the trace finder, plus
//! median-stack combination of bias and flat calibration frames.

pub mod combine;
pub mod median;

pub use combine::{
    combine_bias, combine_flat, median_stack, resolve_frames, FrameInput, ImageLoader,
    LoadedFrame,
};
pub use median::{median, median_filter};
