//! LONGSLIT - spectral extraction and wavelength calibration for long-slit
//! spectrographs.
//!
//! A point source dispersed along the image columns and imaged spatially
//! along the rows is reduced to a calibrated 1-D spectrum in two strands:
//!
//! * object frame -> [`trace_aperture`] -> [`extract_aperture`] +
//!   [`fit_sky`] -> sky-subtracted flux per column
//! * arc-lamp frame -> [`calibrate_arc`] -> 2-D wavelength surface ->
//!   [`map_wavelength`] along the trace
//!
//! Images are `ndarray` arrays of `f64` intensities, rows spatial and
//! columns dispersion, and are never mutated by the pipeline. Container
//! I/O lives behind the [`image_proc::ImageLoader`] seam.

pub mod algo;
pub mod config;
pub mod error;
pub mod extract;
pub mod image_proc;
pub mod linelist;
pub mod sky;
pub mod spectrum;
pub mod trace;
pub mod viz;
pub mod wavecal;

pub use config::{ArcConfig, ExtractConfig, SkyConfig, TraceConfig};
pub use error::ReduceError;
pub use extract::extract_aperture;
pub use linelist::LineList;
pub use sky::fit_sky;
pub use spectrum::{write_spectrum, CalibratedSpectrum};
pub use trace::trace_aperture;
pub use viz::{NullObserver, ReductionEvent, ReductionObserver};
pub use wavecal::{
    calibrate_arc, map_wavelength, ArcParams, DispersionSign, MatchedLine, WavelengthSolution,
};
