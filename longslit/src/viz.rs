//! Observation hooks for human inspection of calibration internals.
//!
//! The pipeline emits events as it works; an observer may render them,
//! log them, or collect them. Nothing flows back into the algorithms.

/// Intermediate calibration data offered for inspection.
#[derive(Debug, Clone, Copy)]
pub enum ReductionEvent<'a> {
    /// The central arc slice, its approximate wavelength axis, and the
    /// peak detection threshold.
    ArcSlice {
        /// Approximate wavelength per dispersion pixel.
        wavelengths: &'a [f64],
        /// Summed flux per dispersion pixel.
        flux: &'a [f64],
        /// Flux threshold above which peaks were accepted.
        threshold: f64,
    },
    /// A detected peak was matched to a line-list entry.
    LineMatched {
        /// Sub-pixel dispersion position of the peak.
        pixel: f64,
        /// Accepted reference wavelength.
        wavelength: f64,
    },
    /// A matched line was traced vertically across the detector.
    LineTraced {
        /// Sub-pixel dispersion position of the line at the center row.
        pixel: f64,
        /// Reference wavelength of the line.
        wavelength: f64,
        /// Surface-fit samples the trace contributed.
        samples: usize,
    },
}

/// Receives [`ReductionEvent`]s during calibration.
pub trait ReductionObserver {
    /// Handle one event. The default implementation discards it.
    fn on_event(&mut self, _event: ReductionEvent<'_>) {}
}

/// Observer that discards every event; for headless reduction.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ReductionObserver for NullObserver {}
