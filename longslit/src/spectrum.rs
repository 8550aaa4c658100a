//! Extracted spectra and their persisted form.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A wavelength-calibrated 1-D spectrum.
///
/// Both sequences share the dispersion-column index of the trace they were
/// derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedSpectrum {
    /// Wavelength per dispersion column.
    pub wavelength: Vec<f64>,
    /// Sky-subtracted flux per dispersion column.
    pub flux: Vec<f64>,
}

impl CalibratedSpectrum {
    /// Pair mapped wavelengths with sky-subtracted flux.
    ///
    /// # Panics
    /// If the sequences differ in length.
    pub fn new(wavelength: Vec<f64>, flux: Vec<f64>) -> Self {
        assert_eq!(
            wavelength.len(),
            flux.len(),
            "wavelength and flux must share the trace's length"
        );
        Self { wavelength, flux }
    }

    /// Number of dispersion columns.
    pub fn len(&self) -> usize {
        self.flux.len()
    }

    /// Whether the spectrum has no columns.
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }
}

/// Write a flux column as a plain numeric text file, one value per line,
/// in dispersion order.
pub fn write_spectrum<P: AsRef<Path>>(path: P, flux: &[f64]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for value in flux {
        writeln!(writer, "{value:e}")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_one_value_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.apextract");

        write_spectrum(&path, &[1.5, -2.0, 0.0]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let parsed: Vec<f64> = lines.iter().map(|l| l.parse().unwrap()).collect();
        assert_eq!(parsed, vec![1.5, -2.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "share the trace's length")]
    fn test_length_mismatch_panics() {
        CalibratedSpectrum::new(vec![1.0], vec![1.0, 2.0]);
    }
}
