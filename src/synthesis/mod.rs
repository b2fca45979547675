//! Waveform synthesis - seeded three-phase voltage/current generation
//!
//! Produces the synthetic signals every other stage consumes. All randomness
//! comes from a caller-supplied `rand::Rng`, so a seeded `StdRng` gives
//! bit-identical output across runs.
//!
//! # Example
//!
//! ```ignore
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let params = WaveformParams::voltage_default();
//! let signal = generate(&params, Phase::A, Quantity::Voltage, start, &mut rng)?;
//! ```

mod machine;
mod waveform;

pub use machine::*;
pub use waveform::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::alarm_policy;

/// Errors in signal synthesis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

impl SynthesisError {
    fn invalid(name: &'static str, value: f64) -> Self {
        SynthesisError::InvalidParameter { name, value }
    }
}

/// Parameters of one synthesized waveform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WaveformParams {
    pub n_samples: usize,
    /// Hz
    pub sample_rate: f64,
    /// Hz
    pub fundamental_hz: f64,
    pub base_amplitude: f64,
    /// 3rd harmonic amplitude as a fraction of `base_amplitude`
    pub harmonic3_ratio: f64,
    /// 5th harmonic amplitude as a fraction of `base_amplitude`
    pub harmonic5_ratio: f64,
    /// Gaussian noise std-dev (same unit as the signal)
    pub noise_std: f64,
    pub dc_offset: f64,
    /// Angle added to the fundamental's argument (radians)
    #[serde(default)]
    pub phase_offset_rad: f64,
}

impl WaveformParams {
    /// 127 V nominal feed, 10 V swing, light 3rd/5th harmonic content
    pub fn voltage_default() -> Self {
        Self {
            n_samples: 1920,
            sample_rate: 1920.0,
            fundamental_hz: 60.0,
            base_amplitude: 10.0,
            harmonic3_ratio: 0.05,
            harmonic5_ratio: 0.02,
            noise_std: 1.0,
            dc_offset: 127.0,
            phase_offset_rad: 0.0,
        }
    }

    /// 10 A nominal load current
    pub fn current_default() -> Self {
        Self {
            base_amplitude: 2.0,
            harmonic3_ratio: 0.08,
            harmonic5_ratio: 0.04,
            noise_std: 0.2,
            dc_offset: 10.0,
            ..Self::voltage_default()
        }
    }

    /// Check every precondition the generator relies on.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.n_samples == 0 {
            return Err(SynthesisError::invalid("n_samples", 0.0));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SynthesisError::invalid("sample_rate", self.sample_rate));
        }
        if crate::types::sample_span(self.sample_rate, self.n_samples).is_none() {
            return Err(SynthesisError::invalid("sample_rate", self.sample_rate));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(SynthesisError::invalid("noise_std", self.noise_std));
        }
        for (name, value) in [
            ("fundamental_hz", self.fundamental_hz),
            ("base_amplitude", self.base_amplitude),
            ("harmonic3_ratio", self.harmonic3_ratio),
            ("harmonic5_ratio", self.harmonic5_ratio),
            ("dc_offset", self.dc_offset),
            ("phase_offset_rad", self.phase_offset_rad),
        ] {
            if !value.is_finite() {
                return Err(SynthesisError::invalid(name, value));
            }
        }
        Ok(())
    }
}

/// Parameters for a full A/B/C voltage + current set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThreePhaseParams {
    pub voltage: WaveformParams,
    pub current: WaveformParams,
    /// Per-phase voltage noise std-dev, A/B/C order
    pub voltage_noise_override: [Option<f64>; 3],
    /// Per-phase current noise std-dev, A/B/C order
    pub current_noise_override: [Option<f64>; 3],
    pub power_factor: f64,
}

impl Default for ThreePhaseParams {
    fn default() -> Self {
        Self {
            voltage: WaveformParams::voltage_default(),
            current: WaveformParams::current_default(),
            voltage_noise_override: [None; 3],
            current_noise_override: [None; 3],
            power_factor: alarm_policy::DEFAULT_POWER_FACTOR,
        }
    }
}

impl ThreePhaseParams {
    pub fn validate(&self) -> Result<(), SynthesisError> {
        self.voltage.validate()?;
        self.current.validate()?;
        if self.voltage.n_samples != self.current.n_samples {
            return Err(SynthesisError::invalid(
                "current.n_samples",
                self.current.n_samples as f64,
            ));
        }
        if self.voltage.sample_rate.to_bits() != self.current.sample_rate.to_bits() {
            return Err(SynthesisError::invalid(
                "current.sample_rate",
                self.current.sample_rate,
            ));
        }
        if !(0.0..=1.0).contains(&self.power_factor) {
            return Err(SynthesisError::invalid("power_factor", self.power_factor));
        }
        Ok(())
    }
}
