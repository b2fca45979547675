//! FFT computation using rustfft
//!
//! Magnitude spectra for the phase signals shown on the spectrum chart.
//!
//! # Features
//!
//! - Exact-length real FFT (no zero padding, no window)
//! - Pre-planned processor for repeated analysis at one length
//! - Dominant-component and local-peak extraction
//! - Plain-text summaries for the CLI
//!
//! # Example
//!
//! ```ignore
//! use webdeck_monitor::processing::{analyze, dominant_frequency};
//!
//! let spectrum = analyze(&signal.values(), signal.sample_rate)?;
//! let (freq, magnitude) = dominant_frequency(&spectrum).unwrap_or_default();
//! ```

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::{ProcessingError, Spectrum};

// ============================================================================
// Standalone FFT Functions
// ============================================================================

/// Compute the one-sided magnitude spectrum of a real sequence.
///
/// Produces `n/2 + 1` bins. The input is only borrowed.
///
/// # Degenerate input
/// * `n == 0` yields an empty spectrum
/// * `n == 1` yields a single 0 Hz bin holding `|x0|`
///
/// # Errors
/// Non-positive or non-finite `sample_rate`, since the frequency axis would be
/// meaningless.
pub fn analyze(samples: &[f64], sample_rate: f64) -> Result<Spectrum, ProcessingError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(ProcessingError::InvalidSamplingRate(sample_rate));
    }

    if samples.is_empty() {
        return Ok(Spectrum {
            frequencies: Vec::new(),
            magnitudes: Vec::new(),
            sample_rate,
            n_samples: 0,
        });
    }

    let processor = FftProcessor::new(samples.len(), sample_rate)?;
    Ok(processor.compute(samples))
}

/// Strongest non-DC component as (frequency, magnitude).
///
/// Bin 0 is skipped because the DC offset of a mains signal dwarfs every AC
/// component. Returns `None` for spectra with fewer than two bins.
pub fn dominant_frequency(spectrum: &Spectrum) -> Option<(f64, f64)> {
    spectrum
        .frequencies
        .iter()
        .zip(spectrum.magnitudes.iter())
        .skip(1)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(&f, &m)| (f, m))
}

/// Find the frequency of peak amplitude within a band.
///
/// Returns both the frequency and amplitude of the maximum within the band.
pub fn find_peak_in_band(spectrum: &Spectrum, low_freq: f64, high_freq: f64) -> Option<(f64, f64)> {
    spectrum
        .frequencies
        .iter()
        .zip(spectrum.magnitudes.iter())
        .filter(|(&f, _)| f >= low_freq && f <= high_freq)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(&f, &m)| (f, m))
}

/// Amplitude at the bin nearest to `freq`, if the spectrum reaches that far.
pub fn magnitude_near(spectrum: &Spectrum, freq: f64) -> Option<f64> {
    let width = spectrum.bin_width();
    if width <= 0.0 || freq < 0.0 {
        return None;
    }
    let bin = (freq / width).round() as usize;
    spectrum.magnitudes.get(bin).copied()
}

/// RMS of the magnitude bins.
pub fn calculate_spectrum_rms(spectrum: &Spectrum) -> f64 {
    if spectrum.magnitudes.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = spectrum.magnitudes.iter().map(|m| m * m).sum();
    (sum_squares / spectrum.magnitudes.len() as f64).sqrt()
}

/// Find dominant frequencies using true peak detection.
///
/// Identifies local maxima (higher than both neighbouring bins), then returns
/// the top N by amplitude, largest first.
pub fn find_dominant_frequencies(spectrum: &Spectrum, n_peaks: usize) -> Vec<(f64, f64)> {
    if spectrum.magnitudes.len() < 3 {
        return spectrum.points().into_iter().skip(1).take(n_peaks).collect();
    }

    let mut peaks: Vec<(f64, f64)> = spectrum
        .magnitudes
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, w)| (spectrum.frequencies[i + 1], w[1]))
        .collect();

    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));
    peaks.truncate(n_peaks);
    peaks
}

/// Format a spectrum for terminal output.
///
/// ```text
/// Spectrum (N=1920, fs=1920.0 Hz, bin width 1.00 Hz)
/// DC: 243840.00
/// Dominant: 60.0 Hz (9600.00)
/// Top peaks:
/// 1. 60.0 Hz: 9600.00
/// 2. 180.0 Hz: 480.00
/// ```
pub fn format_spectrum(spectrum: &Spectrum, top: usize) -> String {
    let mut output = format!(
        "Spectrum (N={}, fs={:.1} Hz, bin width {:.2} Hz)\n",
        spectrum.n_samples,
        spectrum.sample_rate,
        spectrum.bin_width()
    );

    match spectrum.magnitudes.first() {
        Some(dc) => output.push_str(&format!("DC: {:.2}\n", dc)),
        None => {
            output.push_str("(empty signal)\n");
            return output;
        }
    }

    if let Some((f, m)) = dominant_frequency(spectrum) {
        output.push_str(&format!("Dominant: {:.1} Hz ({:.2})\n", f, m));
    }

    output.push_str("Top peaks:\n");
    for (i, (freq, mag)) in find_dominant_frequencies(spectrum, top).iter().enumerate() {
        output.push_str(&format!("{}. {:.1} Hz: {:.2}\n", i + 1, freq, mag));
    }

    output
}

// ============================================================================
// FFT Processor (Pre-planned for repeated use)
// ============================================================================

/// FFT processor with a pre-planned transform.
///
/// Use this when analysing many signals of the same length.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    sampling_rate: f64,
}

impl FftProcessor {
    /// Create a new FFT processor for signals of exactly `size` samples.
    pub fn new(size: usize, sampling_rate: f64) -> Result<Self, ProcessingError> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(ProcessingError::InvalidSamplingRate(sampling_rate));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        Ok(Self {
            fft,
            size,
            sampling_rate,
        })
    }

    /// Compute the one-sided magnitude spectrum.
    ///
    /// Signals shorter than the planned size are zero-padded and longer ones
    /// truncated, so pass signals of the planned length for the exact DFT.
    pub fn compute(&self, signal: &[f64]) -> Spectrum {
        let mut buffer: Vec<Complex<f64>> = signal
            .iter()
            .take(self.size)
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        // Positive frequencies only (up to Nyquist)
        let n_positive = self.size / 2 + 1;
        let magnitudes: Vec<f64> = buffer.iter().take(n_positive).map(|c| c.norm()).collect();
        let frequencies = self.frequency_bins();

        tracing::trace!(
            size = self.size,
            sample_rate = self.sampling_rate,
            bins = magnitudes.len(),
            "Computed magnitude spectrum"
        );

        Spectrum {
            frequencies,
            magnitudes,
            sample_rate: self.sampling_rate,
            n_samples: self.size,
        }
    }

    /// Get frequency bins for this FFT configuration
    pub fn frequency_bins(&self) -> Vec<f64> {
        if self.size == 0 {
            return Vec::new();
        }
        let n_positive = self.size / 2 + 1;
        let freq_resolution = self.frequency_resolution();
        (0..n_positive).map(|i| i as f64 * freq_resolution).collect()
    }

    /// Get the FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the frequency resolution (Hz per bin)
    pub fn frequency_resolution(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.sampling_rate / self.size as f64
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
