//! Reference emission-line lists for wavelength calibration.

use std::fs;
use std::path::Path;

use crate::error::ReduceError;

/// Read-only set of reference wavelengths, sorted ascending.
#[derive(Debug, Clone)]
pub struct LineList {
    wavelengths: Vec<f64>,
}

impl LineList {
    /// Build a line list from wavelengths already in memory.
    ///
    /// Fails when no finite wavelengths are supplied.
    pub fn from_wavelengths(wavelengths: Vec<f64>) -> Result<Self, ReduceError> {
        let mut wavelengths: Vec<f64> =
            wavelengths.into_iter().filter(|w| w.is_finite()).collect();
        if wavelengths.is_empty() {
            return Err(ReduceError::EmptyLineList);
        }
        wavelengths.sort_by(|a, b| a.partial_cmp(b).unwrap());
        Ok(Self { wavelengths })
    }

    /// Load a line list from a whitespace-delimited text table.
    ///
    /// The first row is a header and is skipped; the first column of each
    /// remaining non-empty row is parsed as a wavelength.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReduceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ReduceError::LineListIo {
            path: path.to_path_buf(),
            source,
        })?;

        let mut wavelengths = Vec::new();
        for (index, line) in text.lines().enumerate().skip(1) {
            let Some(token) = line.split_whitespace().next() else {
                continue;
            };
            let value: f64 = token.parse().map_err(|_| ReduceError::LineListParse {
                path: path.to_path_buf(),
                line: index + 1,
                value: token.to_string(),
            })?;
            wavelengths.push(value);
        }

        Self::from_wavelengths(wavelengths)
    }

    /// The list entry nearest to `wavelength`.
    pub fn nearest(&self, wavelength: f64) -> f64 {
        let idx = self.wavelengths.partition_point(|&w| w < wavelength);
        let mut best = if idx < self.wavelengths.len() {
            self.wavelengths[idx]
        } else {
            self.wavelengths[idx - 1]
        };
        if idx > 0 {
            let below = self.wavelengths[idx - 1];
            if (wavelength - below).abs() < (wavelength - best).abs() {
                best = below;
            }
        }
        best
    }

    /// All wavelengths, ascending.
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Number of reference lines.
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// Whether the list is empty. Always false for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }
}
