//! Sine + odd-harmonic + Gaussian-noise generator

use chrono::{DateTime, Utc};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use super::{SynthesisError, ThreePhaseParams, WaveformParams};
use crate::types::{Phase, PhaseChannels, PhaseSignal, PowerTriplet, Quantity, Sample};

/// Noise-free value of the waveform at time `t` (seconds).
///
/// `dc + A·sin(θ) + h3·A·sin(3θ) + h5·A·sin(5θ)` with `θ = 2πft + φ`.
pub fn clean_value(params: &WaveformParams, t: f64) -> f64 {
    let theta = 2.0 * PI * params.fundamental_hz * t + params.phase_offset_rad;
    let a = params.base_amplitude;

    params.dc_offset
        + a * theta.sin()
        + params.harmonic3_ratio * a * (3.0 * theta).sin()
        + params.harmonic5_ratio * a * (5.0 * theta).sin()
}

/// Generate one phase signal.
///
/// Draws exactly `n_samples` values from `rng`, one Gaussian per sample.
pub fn generate<R: Rng + ?Sized>(
    params: &WaveformParams,
    phase: Phase,
    quantity: Quantity,
    start: DateTime<Utc>,
    rng: &mut R,
) -> Result<PhaseSignal, SynthesisError> {
    params.validate()?;

    let noise = Normal::new(0.0, params.noise_std)
        .map_err(|_| SynthesisError::invalid("noise_std", params.noise_std))?;

    let values = (0..params.n_samples).map(|i| {
        let t = i as f64 / params.sample_rate;
        clean_value(params, t) + noise.sample(rng)
    });

    let signal = PhaseSignal::from_values(phase, quantity, start, params.sample_rate, values)
        .ok_or_else(|| SynthesisError::invalid("sample_rate", params.sample_rate))?;

    tracing::debug!(
        phase = %phase,
        quantity = %quantity,
        n = signal.len(),
        sample_rate = params.sample_rate,
        "Synthesized phase signal"
    );

    Ok(signal)
}

/// Generate A/B/C voltage and current with per-sample power.
///
/// Phases are offset by ±120°. Voltage and current for a phase share the
/// phase angle; per-phase noise overrides replace the template's `noise_std`.
pub fn generate_three_phase<R: Rng + ?Sized>(
    params: &ThreePhaseParams,
    start: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<PhaseChannels>, SynthesisError> {
    params.validate()?;

    let mut channels = Vec::with_capacity(Phase::ALL.len());

    for phase in Phase::ALL {
        let voltage_params = per_phase(&params.voltage, phase, params.voltage_noise_override);
        let current_params = per_phase(&params.current, phase, params.current_noise_override);

        let voltage = generate(&voltage_params, phase, Quantity::Voltage, start, rng)?;
        let current = generate(&current_params, phase, Quantity::Current, start, rng)?;
        let power = derive_power(&voltage, &current, params.power_factor)?;

        channels.push(PhaseChannels {
            phase,
            voltage,
            current,
            power,
        });
    }

    Ok(channels)
}

fn per_phase(template: &WaveformParams, phase: Phase, overrides: [Option<f64>; 3]) -> WaveformParams {
    WaveformParams {
        noise_std: overrides[phase.index()].unwrap_or(template.noise_std),
        phase_offset_rad: template.phase_offset_rad + phase.angle_rad(),
        ..*template
    }
}

/// Pair voltage and current sample-by-sample into power triplets.
///
/// Both signals must be the same length; timestamps come from the voltage.
pub fn derive_power(
    voltage: &PhaseSignal,
    current: &PhaseSignal,
    power_factor: f64,
) -> Result<Vec<PowerTriplet>, SynthesisError> {
    if !(0.0..=1.0).contains(&power_factor) {
        return Err(SynthesisError::invalid("power_factor", power_factor));
    }
    if voltage.len() != current.len() {
        return Err(SynthesisError::invalid("current.len", current.len() as f64));
    }

    Ok(voltage
        .samples
        .iter()
        .zip(current.samples.iter())
        .map(|(v, i)| PowerTriplet::from_readings(v.timestamp, v.value, i.value, power_factor))
        .collect())
}

/// Synthetic check response times (ms), floored at zero.
pub fn generate_response_times<R: Rng + ?Sized>(
    timestamps: &[DateTime<Utc>],
    base_ms: f64,
    jitter_std_ms: f64,
    rng: &mut R,
) -> Result<Vec<Sample>, SynthesisError> {
    if !base_ms.is_finite() || base_ms < 0.0 {
        return Err(SynthesisError::invalid("response_time_base_ms", base_ms));
    }
    let jitter = Normal::new(0.0, jitter_std_ms)
        .map_err(|_| SynthesisError::invalid("response_time_jitter_ms", jitter_std_ms))?;

    Ok(timestamps
        .iter()
        .map(|&timestamp| Sample {
            timestamp,
            value: (base_ms + jitter.sample(rng)).max(0.0),
        })
        .collect())
}
