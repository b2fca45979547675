//! Signal processing module - FFT magnitude spectra of phase signals

mod fft;

pub use fft::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in signal processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),
}

/// One-sided magnitude spectrum
///
/// `frequencies[k] = k · sample_rate / n` and `magnitudes[k] = |X_k|` of the
/// unnormalized DFT, for `k` in `0..=n/2`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spectrum {
    /// Frequency bins (Hz)
    pub frequencies: Vec<f64>,
    /// Magnitude at each frequency
    pub magnitudes: Vec<f64>,
    /// Sample rate used
    pub sample_rate: f64,
    /// Length of the analysed signal
    pub n_samples: usize,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Hz per bin; zero for an empty spectrum
    pub fn bin_width(&self) -> f64 {
        if self.n_samples == 0 {
            0.0
        } else {
            self.sample_rate / self.n_samples as f64
        }
    }

    /// (frequency, magnitude) pairs for charting
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
            .collect()
    }
}
