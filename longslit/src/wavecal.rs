//! Arc-lamp wavelength calibration.
//!
//! Derives a 2-D wavelength solution from an arc exposure: detect emission
//! peaks in a central slice, greedily match them to a reference line list
//! while refining a 1-D polynomial solution, trace each matched line
//! vertically across the detector, and fit a smooth surface through the
//! resulting (x, y, wavelength) cloud.

use itertools::Itertools;
use log::{debug, info, warn};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::algo::{fit_gaussian, BivariateSurface, GaussianProfile, LmConfig, Polynomial};
use crate::config::ArcConfig;
use crate::error::ReduceError;
use crate::image_proc::median;
use crate::linelist::LineList;
use crate::viz::{ReductionEvent, ReductionObserver};

/// Direction wavelength runs along the dispersion axis.
///
/// Detector sides can read out with wavelength increasing or decreasing in
/// pixel index; the header's detector tag selects the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispersionSign {
    /// Wavelength grows with pixel index.
    Increasing,
    /// Wavelength shrinks with pixel index.
    Decreasing,
}

impl DispersionSign {
    /// Multiplier applied to the linear dispersion.
    pub fn factor(self) -> f64 {
        match self {
            DispersionSign::Increasing => 1.0,
            DispersionSign::Decreasing => -1.0,
        }
    }
}

/// Header-derived linear guess at the wavelength solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcParams {
    /// Approximate wavelength per pixel.
    pub dispersion: f64,
    /// Approximate wavelength at the center of the dispersion axis.
    pub center_wavelength: f64,
    /// Dispersion direction for this detector side.
    pub sign: DispersionSign,
}

/// A detected peak accepted against the line list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedLine {
    /// Sub-pixel dispersion position at the center row.
    pub pixel: f64,
    /// Reference wavelength, always drawn from the line list.
    pub wavelength: f64,
}

/// Full wavelength calibration derived from one arc exposure.
#[derive(Debug, Clone)]
pub struct WavelengthSolution {
    /// Smooth wavelength surface over the detector.
    pub surface: BivariateSurface,
    /// 1-D pixel-to-wavelength polynomial along the central slice.
    pub center_solution: Polynomial,
    /// Matched (pixel, wavelength) pairs that drove the fit.
    pub matched: Vec<MatchedLine>,
}

/// Detected peak awaiting a line-list match.
struct PeakCandidate {
    /// Sub-pixel dispersion position from the profile fit.
    pixel: f64,
    /// Wavelength of the raw peak under the linear guess.
    approx_wavelength: f64,
}

/// Derive the wavelength solution from an arc-lamp exposure.
///
/// `row_mask`, when given, marks the spatial rows valid for vertical line
/// tracing (from the flat's illumination mask) and must have one entry per
/// image row.
pub fn calibrate_arc(
    image: ArrayView2<f64>,
    params: &ArcParams,
    lines: &LineList,
    row_mask: Option<&[bool]>,
    config: &ArcConfig,
    observer: &mut dyn ReductionObserver,
) -> Result<WavelengthSolution, ReduceError> {
    let (rows, cols) = image.dim();
    if let Some(mask) = row_mask {
        assert_eq!(mask.len(), rows, "row mask must have one entry per row");
    }

    let fit_config = LmConfig::default();
    let center_row = rows / 2;
    let half_pixel = cols as f64 / 2.0;

    // Stage A: collapse a central slice and find peaks above the flux
    // percentile threshold.
    let slice_lo = center_row.saturating_sub(config.slice_half_height);
    let slice_hi = (center_row + config.slice_half_height).min(rows);
    let slice: Vec<f64> = (0..cols)
        .map(|c| (slice_lo..slice_hi).map(|r| image[[r, c]]).sum())
        .collect();

    let disp = params.dispersion * params.sign.factor();
    let wtemp: Vec<f64> = (0..cols)
        .map(|i| (i as f64 - half_pixel) * disp + params.center_wavelength)
        .collect();

    let threshold = {
        let mut sorted = slice.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("non-finite flux"));
        let idx = ((sorted.len() as f64 * config.flux_percentile) as usize).min(sorted.len() - 1);
        sorted[idx]
    };
    observer.on_event(ReductionEvent::ArcSlice {
        wavelengths: &wtemp,
        flux: &slice,
        threshold,
    });

    let high: Vec<usize> = (0..cols).filter(|&i| slice[i] >= threshold).collect();
    let mut peaks: Vec<usize> = Vec::new();
    // Consecutive indices share (index - rank); a gap of more than one
    // pixel starts a new peak.
    for (_, run) in &high
        .into_iter()
        .enumerate()
        .group_by(|&(rank, i)| i as i64 - rank as i64)
    {
        let peak = run
            .map(|(_, i)| i)
            .max_by(|&a, &b| slice[a].partial_cmp(&slice[b]).unwrap())
            .unwrap();
        peaks.push(peak);
    }
    peaks.retain(|&p| p > config.peak_margin && p < cols - config.peak_margin);

    if peaks.is_empty() {
        return Err(ReduceError::NoCalibrationLines);
    }
    debug!("{} candidate arc peaks above threshold {threshold:.1}", peaks.len());

    // Stage B: refine each peak to a sub-pixel center.
    let slice_median = median(&slice);
    let mut candidates: Vec<PeakCandidate> = Vec::with_capacity(peaks.len());
    for &p in &peaks {
        let w0 = p - config.peak_margin;
        let w1 = (p + 2 * config.peak_margin).min(cols);
        let x: Vec<f64> = (w0..w1).map(|i| i as f64).collect();
        let y: Vec<f64> = (w0..w1).map(|i| slice[i]).collect();

        let peak_idx = w0
            + y.iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap_or(0);
        let guess = GaussianProfile {
            amplitude: slice[peak_idx],
            baseline: slice_median,
            center: peak_idx as f64,
            width: 2.0,
        };

        match fit_gaussian(&x, &y, guess, &fit_config) {
            Ok(fit) => candidates.push(PeakCandidate {
                pixel: fit.center,
                approx_wavelength: wtemp[peak_idx],
            }),
            Err(e) => debug!("arc peak at pixel {p} dropped: {e}"),
        }
    }

    // Stage C: greedy center-outward matching with in-loop polynomial
    // refinement. The polynomial and accepted pairs are the explicit loop
    // state; anchoring on central lines first keeps the extrapolation to
    // the band edges honest.
    let ordered = candidates.into_iter().sorted_by(|a, b| {
        let da = (a.approx_wavelength - params.center_wavelength).abs();
        let db = (b.approx_wavelength - params.center_wavelength).abs();
        da.partial_cmp(&db).unwrap()
    });

    let mut solution = Polynomial::new(half_pixel, vec![params.center_wavelength, disp]);
    let mut matched: Vec<MatchedLine> = Vec::new();

    for candidate in ordered {
        let predicted = solution.eval(candidate.pixel);
        let nearest = lines.nearest(predicted);
        if (nearest - predicted).abs() >= config.tolerance {
            debug!(
                "peak at pixel {:.2} ({predicted:.1}) has no line within tolerance",
                candidate.pixel
            );
            continue;
        }

        matched.push(MatchedLine {
            pixel: candidate.pixel,
            wavelength: nearest,
        });
        observer.on_event(ReductionEvent::LineMatched {
            pixel: candidate.pixel,
            wavelength: nearest,
        });

        if matched.len() > config.poly_order {
            let px: Vec<f64> = matched.iter().map(|m| m.pixel).collect();
            let wl: Vec<f64> = matched.iter().map(|m| m.wavelength).collect();
            match Polynomial::fit(&px, &wl, config.poly_order) {
                Ok(refit) => solution = refit,
                Err(e) => warn!("wavelength polynomial refit failed: {e}"),
            }
        }
    }

    if matched.is_empty() {
        return Err(ReduceError::NoMatchedLines);
    }
    if matched.len() <= config.poly_order {
        warn!(
            "only {} arc lines matched; keeping the linear seed solution",
            matched.len()
        );
    }
    info!("matched {} of {} line-list entries", matched.len(), lines.len());

    // Stage D: trace each matched line vertically, chaining each row's
    // fitted center into the next row's initial guess. Both directions
    // start from the matched center.
    let image_median = {
        let all: Vec<f64> = image.iter().copied().collect();
        median(&all)
    };

    let row_valid = |r: usize| row_mask.map_or(true, |m| m[r]);
    let upward: Vec<usize> = (center_row..rows).filter(|&r| row_valid(r)).collect();
    let downward: Vec<usize> = (0..center_row).rev().filter(|&r| row_valid(r)).collect();

    let mut samples: Vec<(f64, f64, f64)> = Vec::new();
    for line in &matched {
        let ip = line.pixel as i64;
        let w0 = (ip - config.max_bend as i64).max(0) as usize;
        let w1 = ((ip + config.max_bend as i64).max(0) as usize).min(cols);
        let x: Vec<f64> = (w0..w1).map(|i| i as f64).collect();

        let mut line_samples = 0;
        for direction in [&upward, &downward] {
            let mut center_guess = line.pixel;
            for &r in direction.iter() {
                let y: Vec<f64> = (w0..w1).map(|c| image[[r, c]]).collect();
                let peak = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let guess = GaussianProfile {
                    amplitude: peak,
                    baseline: image_median,
                    center: center_guess,
                    width: 2.0,
                };

                match fit_gaussian(&x, &y, guess, &fit_config) {
                    Ok(fit) => {
                        center_guess = fit.center;
                        samples.push((fit.center, r as f64, line.wavelength));
                        line_samples += 1;
                    }
                    Err(e) => {
                        debug!(
                            "row {r} of line at {:.2} excluded: {e}",
                            line.pixel
                        );
                    }
                }
            }
        }
        observer.on_event(ReductionEvent::LineTraced {
            pixel: line.pixel,
            wavelength: line.wavelength,
            samples: line_samples,
        });
    }

    // Stage E: smooth surface over the sample cloud, bounded by the full
    // detector extent.
    if samples.len() < BivariateSurface::MIN_SAMPLES {
        return Err(ReduceError::InsufficientCalibrationSamples {
            got: samples.len(),
            needed: BivariateSurface::MIN_SAMPLES,
        });
    }
    let surface = BivariateSurface::fit(&samples, (0.0, cols as f64), (0.0, rows as f64))?;

    Ok(WavelengthSolution {
        surface,
        center_solution: solution,
        matched,
    })
}

/// Assign a wavelength to every column of a trace.
///
/// Evaluates the wavelength surface at the trace's spatial position in each
/// column. Columns outside the calibration image's bounding box extrapolate
/// without accuracy guarantees.
pub fn map_wavelength(trace: &[f64], surface: &BivariateSurface) -> Vec<f64> {
    trace
        .iter()
        .enumerate()
        .map(|(i, &t)| surface.eval(i as f64, t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::NullObserver;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    const ROWS: usize = 100;
    const COLS: usize = 400;
    const LINE_PIXELS: [f64; 5] = [60.0, 130.0, 200.0, 270.0, 340.0];
    const LINE_AMPS: [f64; 5] = [1000.0, 900.0, 1100.0, 950.0, 1050.0];

    fn wavelength_at(pixel: f64, sign: DispersionSign) -> f64 {
        5000.0 + sign.factor() * 2.0 * (pixel - COLS as f64 / 2.0)
    }

    /// Arc exposure with straight vertical lines at known pixels.
    fn arc_image(sign: DispersionSign) -> (Array2<f64>, ArcParams, LineList) {
        let mut image = Array2::from_elem((ROWS, COLS), 10.0);
        for (&p, &a) in LINE_PIXELS.iter().zip(LINE_AMPS.iter()) {
            for c in 0..COLS {
                let d = c as f64 - p;
                let value = a * (-d * d / (2.0 * 1.5 * 1.5)).exp();
                if value > 1e-6 {
                    for r in 0..ROWS {
                        image[[r, c]] += value;
                    }
                }
            }
        }

        let params = ArcParams {
            dispersion: 2.0,
            center_wavelength: 5000.0,
            sign,
        };
        let lines = LineList::from_wavelengths(
            LINE_PIXELS.iter().map(|&p| wavelength_at(p, sign)).collect(),
        )
        .unwrap();

        (image, params, lines)
    }

    #[test]
    fn test_round_trip_matches_all_lines() {
        let (image, params, lines) = arc_image(DispersionSign::Increasing);
        let solution = calibrate_arc(
            image.view(),
            &params,
            &lines,
            None,
            &ArcConfig::default(),
            &mut NullObserver,
        )
        .unwrap();

        assert_eq!(solution.matched.len(), 5);
        for m in &solution.matched {
            let truth = wavelength_at(m.pixel, DispersionSign::Increasing);
            assert_relative_eq!(m.wavelength, truth, epsilon = 0.1);
            assert_relative_eq!(solution.center_solution.eval(m.pixel), truth, epsilon = 0.1);
        }
    }

    #[test]
    fn test_surface_reproduces_linear_dispersion() {
        let (image, params, lines) = arc_image(DispersionSign::Increasing);
        let solution = calibrate_arc(
            image.view(),
            &params,
            &lines,
            None,
            &ArcConfig::default(),
            &mut NullObserver,
        )
        .unwrap();

        for &x in &[80.0, 150.0, 220.0, 310.0] {
            for &y in &[20.0, 50.0, 80.0] {
                let truth = wavelength_at(x, DispersionSign::Increasing);
                assert_relative_eq!(solution.surface.eval(x, y), truth, epsilon = 0.1);
            }
        }
    }

    #[test]
    fn test_mapped_wavelengths_monotonic() {
        for sign in [DispersionSign::Increasing, DispersionSign::Decreasing] {
            let (image, params, lines) = arc_image(sign);
            let solution = calibrate_arc(
                image.view(),
                &params,
                &lines,
                None,
                &ArcConfig::default(),
                &mut NullObserver,
            )
            .unwrap();

            let trace = vec![50.0; COLS];
            let mapped = map_wavelength(&trace, &solution.surface);
            assert_eq!(mapped.len(), COLS);
            for w in mapped.windows(2) {
                match sign {
                    DispersionSign::Increasing => assert!(w[1] > w[0]),
                    DispersionSign::Decreasing => assert!(w[1] < w[0]),
                }
            }
        }
    }

    #[test]
    fn test_row_mask_limits_samples() {
        let (image, params, lines) = arc_image(DispersionSign::Increasing);
        let mut mask = vec![true; ROWS];
        for m in mask.iter_mut().take(20) {
            *m = false;
        }

        let solution = calibrate_arc(
            image.view(),
            &params,
            &lines,
            Some(&mask),
            &ArcConfig::default(),
            &mut NullObserver,
        )
        .unwrap();

        // Masked rows contribute nothing, but the solution still stands.
        assert_eq!(solution.matched.len(), 5);
        assert_relative_eq!(
            solution.surface.eval(200.0, 60.0),
            5000.0,
            epsilon = 0.1
        );
    }

    #[test]
    fn test_blank_arc_fails() {
        let image = Array2::from_elem((ROWS, COLS), 10.0);
        let params = ArcParams {
            dispersion: 2.0,
            center_wavelength: 5000.0,
            sign: DispersionSign::Increasing,
        };
        let lines = LineList::from_wavelengths(vec![5000.0]).unwrap();

        let result = calibrate_arc(
            image.view(),
            &params,
            &lines,
            None,
            &ArcConfig::default(),
            &mut NullObserver,
        );
        assert!(matches!(
            result,
            Err(ReduceError::NoCalibrationLines) | Err(ReduceError::NoMatchedLines)
        ));
    }

    #[test]
    fn test_distant_line_list_matches_nothing() {
        let (image, params, _) = arc_image(DispersionSign::Increasing);
        let lines = LineList::from_wavelengths(vec![9000.0, 9100.0]).unwrap();

        let result = calibrate_arc(
            image.view(),
            &params,
            &lines,
            None,
            &ArcConfig::default(),
            &mut NullObserver,
        );
        assert!(matches!(result, Err(ReduceError::NoMatchedLines)));
    }
}
