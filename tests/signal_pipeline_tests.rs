//! Signal Pipeline Tests
//!
//! Synthesis into spectrum analysis, with seeded RNGs so every run sees the
//! same samples.

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use webdeck_monitor::processing::{self, ProcessingError};
use webdeck_monitor::synthesis::{self, SynthesisError, ThreePhaseParams, WaveformParams};
use webdeck_monitor::types::{Phase, Quantity};

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn pure_sine(n_samples: usize) -> WaveformParams {
    WaveformParams {
        n_samples,
        harmonic3_ratio: 0.0,
        harmonic5_ratio: 0.0,
        noise_std: 0.0,
        ..WaveformParams::voltage_default()
    }
}

// ============================================================================
// Synthesis
// ============================================================================

#[test]
fn same_seed_same_samples() {
    let params = WaveformParams::voltage_default();
    let a = synthesis::generate(&params, Phase::A, Quantity::Voltage, start(), &mut StdRng::seed_from_u64(42)).unwrap();
    let b = synthesis::generate(&params, Phase::A, Quantity::Voltage, start(), &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn generated_signal_has_requested_length_and_spacing() {
    let params = WaveformParams::voltage_default();
    let signal = synthesis::generate(&params, Phase::B, Quantity::Voltage, start(), &mut StdRng::seed_from_u64(1)).unwrap();

    assert_eq!(signal.len(), 1920);
    assert_eq!(signal.samples[0].timestamp, start());
    let step = signal.samples[1].timestamp - signal.samples[0].timestamp;
    assert_eq!(step.num_nanoseconds(), Some(520_833));
}

#[test]
fn zero_noise_follows_the_closed_form() {
    let params = pure_sine(64);
    let signal = synthesis::generate(&params, Phase::A, Quantity::Voltage, start(), &mut StdRng::seed_from_u64(9)).unwrap();
    for (i, s) in signal.samples.iter().enumerate() {
        let expected = synthesis::clean_value(&params, i as f64 / params.sample_rate);
        assert!((s.value - expected).abs() < 1e-12, "sample {i}: {} vs {expected}", s.value);
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let mut rng = StdRng::seed_from_u64(0);
    let cases = [
        WaveformParams { n_samples: 0, ..WaveformParams::voltage_default() },
        WaveformParams { sample_rate: 0.0, ..WaveformParams::voltage_default() },
        WaveformParams { noise_std: -1.0, ..WaveformParams::voltage_default() },
    ];
    for params in cases {
        let result = synthesis::generate(&params, Phase::A, Quantity::Voltage, start(), &mut rng);
        assert!(
            matches!(result, Err(SynthesisError::InvalidParameter { .. })),
            "Expected rejection for {:?}",
            params
        );
    }
}

#[test]
fn three_phase_set_has_power_for_every_sample() {
    let params = ThreePhaseParams::default();
    let phases = synthesis::generate_three_phase(&params, start(), &mut StdRng::seed_from_u64(5)).unwrap();

    assert_eq!(phases.len(), 3);
    for channels in &phases {
        assert_eq!(channels.voltage.len(), channels.current.len());
        assert_eq!(channels.power.len(), channels.voltage.len());
        let p = channels.power[0];
        let expected_s = channels.voltage.samples[0].value * channels.current.samples[0].value;
        assert!((p.apparent - expected_s).abs() < 1e-9);
        assert!((p.active - expected_s * params.power_factor).abs() < 1e-9);
    }
}

// ============================================================================
// Spectrum
// ============================================================================

#[test]
fn short_window_peak_lands_on_nearest_bin() {
    // n=60, fs=1920: 32 Hz bins, so 60 Hz falls nearest the 64 Hz bin
    let params = pure_sine(60);
    let signal = synthesis::generate(&params, Phase::A, Quantity::Voltage, start(), &mut StdRng::seed_from_u64(3)).unwrap();
    let spectrum = processing::analyze(&signal.values(), signal.sample_rate).unwrap();

    assert_eq!(spectrum.len(), 31);
    let (peak_hz, _) = processing::dominant_frequency(&spectrum).expect("non-DC bins exist");
    assert!((peak_hz - 60.0).abs() <= spectrum.bin_width(), "peak at {peak_hz} Hz");
    assert_eq!(peak_hz, 64.0);
}

#[test]
fn full_window_resolves_fundamental_and_harmonics() {
    let params = WaveformParams {
        noise_std: 0.0,
        ..WaveformParams::voltage_default()
    };
    let signal = synthesis::generate(&params, Phase::C, Quantity::Voltage, start(), &mut StdRng::seed_from_u64(3)).unwrap();
    let spectrum = processing::analyze(&signal.values(), signal.sample_rate).unwrap();

    let (peak_hz, peak_mag) = processing::dominant_frequency(&spectrum).unwrap();
    assert!((peak_hz - 60.0).abs() < 1e-9);
    // Unnormalized: |X| = A·N/2 for a bin-aligned sine
    assert!((peak_mag - 10.0 * 1920.0 / 2.0).abs() < 1e-6);

    let h3 = processing::magnitude_near(&spectrum, 180.0).unwrap();
    assert!((h3 - 0.5 * 1920.0 / 2.0).abs() < 1e-6);
}

#[test]
fn frequencies_run_from_dc_to_nyquist() {
    let spectrum = processing::analyze(&[1.0; 64], 1920.0).unwrap();
    assert_eq!(spectrum.frequencies.first(), Some(&0.0));
    assert_eq!(spectrum.frequencies.last(), Some(&960.0));
    assert_eq!(spectrum.frequencies.len(), spectrum.magnitudes.len());
}

#[test]
fn bad_sample_rate_is_rejected() {
    for rate in [0.0, -10.0, f64::NAN] {
        assert!(matches!(
            processing::analyze(&[1.0, 2.0], rate),
            Err(ProcessingError::InvalidSamplingRate(_))
        ));
    }
}
