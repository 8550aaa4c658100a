use serde::{Deserialize, Serialize};

/// Configuration for aperture trace finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceConfig {
    /// Number of bin edges along the dispersion axis; `nsteps - 1` column
    /// windows are fit.
    pub nsteps: usize,
    /// Side length of the square median pre-filter window (odd).
    pub median_window: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            nsteps: 100,
            median_window: 5,
        }
    }
}

/// Configuration for aperture flux extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractConfig {
    /// Aperture half-width around the trace, in pixels.
    pub apwidth: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { apwidth: 5.0 }
    }
}

/// Configuration for the per-column sky background fit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkyConfig {
    /// Aperture half-width the sky estimate is integrated over, in pixels.
    pub apwidth: f64,
    /// Gap between the trace and the inner edge of each sky band, in rows.
    pub separation: usize,
    /// Width of each sky band, in rows.
    pub band_width: usize,
    /// Degree of the polynomial fit through both sky bands.
    pub degree: usize,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            apwidth: 5.0,
            separation: 25,
            band_width: 75,
            degree: 2,
        }
    }
}

/// Configuration for arc-lamp wavelength calibration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArcConfig {
    /// Half-height of the central spatial slice summed for peak detection.
    pub slice_half_height: usize,
    /// Flux percentile used as the peak detection threshold (0.0 - 1.0).
    pub flux_percentile: f64,
    /// Candidates closer than this to either dispersion edge are discarded,
    /// and the per-peak fit window extends this far before the peak and
    /// twice this far after it.
    pub peak_margin: usize,
    /// Maximum |predicted - list| wavelength distance for a greedy match.
    pub tolerance: f64,
    /// Order of the 1-D pixel-to-wavelength polynomial.
    pub poly_order: usize,
    /// Half-width of the window used when tracing a line vertically, in
    /// pixels; bounds how far a line may bend.
    pub max_bend: usize,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            slice_half_height: 10,
            flux_percentile: 0.97,
            peak_margin: 10,
            tolerance: 15.0,
            poly_order: 3,
            max_bend: 10,
        }
    }
}
