//! Threshold alarm evaluation
//!
//! Classifies samples of a phase signal against a voltage band and reduces the
//! resulting alarm set to a [`SeverityIndicator`].
//!
//! ## Rules
//!
//! - `value < min` → Below, `value > max` → Above
//! - Values inside `[min, max]` (inclusive) and NaN samples raise nothing
//! - Output keeps the signal's chronological order
//! - Evaluation is stateless: identical inputs give identical output
//!
//! ## Usage
//!
//! ```ignore
//! let alarms = evaluate(&signal, 120.0, 140.0)?;
//! match severity(&alarms) {
//!     SeverityIndicator::None => { /* green */ }
//!     SeverityIndicator::Moderate => { /* yellow */ }
//!     SeverityIndicator::Severe => { /* red */ }
//! }
//! ```

use thiserror::Error;

use crate::types::{
    AlarmKind, AlarmRecord, Incident, Phase, PhaseSignal, SeverityIndicator, SeverityPolicy,
    ThresholdConfig,
};

// ============================================================================
// Errors
// ============================================================================

/// Which part of a threshold band is unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeViolation {
    /// `min >= max`
    MinNotBelowMax,
    MinNotFinite,
    MaxNotFinite,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlarmError {
    #[error("Invalid threshold range [{min}, {max}]: {}", describe(.violation, .min, .max))]
    InvalidRange {
        min: f64,
        max: f64,
        violation: RangeViolation,
    },
}

fn describe(violation: &RangeViolation, min: &f64, max: &f64) -> String {
    match violation {
        RangeViolation::MinNotBelowMax => {
            format!("minimum voltage {min} must be below maximum voltage {max}")
        }
        RangeViolation::MinNotFinite => format!("minimum voltage {min} is not a finite number"),
        RangeViolation::MaxNotFinite => format!("maximum voltage {max} is not a finite number"),
    }
}

/// Reject bands that cannot classify anything meaningfully.
pub fn validate_range(min_v: f64, max_v: f64) -> Result<(), AlarmError> {
    let violation = if !min_v.is_finite() {
        Some(RangeViolation::MinNotFinite)
    } else if !max_v.is_finite() {
        Some(RangeViolation::MaxNotFinite)
    } else if min_v >= max_v {
        Some(RangeViolation::MinNotBelowMax)
    } else {
        None
    };

    match violation {
        Some(violation) => Err(AlarmError::InvalidRange {
            min: min_v,
            max: max_v,
            violation,
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Extract every out-of-band sample of `signal`.
pub fn evaluate(signal: &PhaseSignal, min_v: f64, max_v: f64) -> Result<Vec<AlarmRecord>, AlarmError> {
    validate_range(min_v, max_v)?;

    let alarms: Vec<AlarmRecord> = signal
        .samples
        .iter()
        .enumerate()
        .filter_map(|(index, s)| {
            let kind = if s.value < min_v {
                AlarmKind::Below
            } else if s.value > max_v {
                AlarmKind::Above
            } else {
                return None;
            };
            Some(AlarmRecord {
                index,
                timestamp: s.timestamp,
                value: s.value,
                kind,
            })
        })
        .collect();

    tracing::debug!(
        phase = %signal.phase,
        quantity = %signal.quantity,
        samples = signal.len(),
        alarms = alarms.len(),
        min_v,
        max_v,
        "Evaluated threshold band"
    );

    Ok(alarms)
}

/// [`evaluate`] with the band taken from a [`ThresholdConfig`].
pub fn evaluate_with(signal: &PhaseSignal, thresholds: &ThresholdConfig) -> Result<Vec<AlarmRecord>, AlarmError> {
    evaluate(signal, thresholds.min_v, thresholds.max_v)
}

/// Severity under the default policy (0 / 1..=20 / >20).
pub fn severity(alarms: &[AlarmRecord]) -> SeverityIndicator {
    severity_with(alarms, &SeverityPolicy::default())
}

pub fn severity_with(alarms: &[AlarmRecord], policy: &SeverityPolicy) -> SeverityIndicator {
    policy.classify(alarms.len())
}

// ============================================================================
// Incidents
// ============================================================================

/// Group alarms into runs of consecutive sample indices with the same kind.
///
/// `alarms` must come from one [`evaluate`] call (chronological order). The
/// excursion is measured against `thresholds`.
pub fn incidents(
    machine: &str,
    phase: Phase,
    alarms: &[AlarmRecord],
    thresholds: &ThresholdConfig,
) -> Vec<Incident> {
    let excursion = |a: &AlarmRecord| match a.kind {
        AlarmKind::Above => a.value - thresholds.max_v,
        AlarmKind::Below => thresholds.min_v - a.value,
    };

    let mut runs: Vec<Incident> = Vec::new();
    let mut last_index: Option<usize> = None;

    for alarm in alarms {
        let continues = matches!(
            (runs.last(), last_index),
            (Some(run), Some(prev)) if run.kind == alarm.kind && alarm.index == prev + 1
        );

        match runs.last_mut() {
            Some(run) if continues => {
                run.end = alarm.timestamp;
                run.samples += 1;
                run.peak_excursion = run.peak_excursion.max(excursion(alarm));
            }
            _ => runs.push(Incident {
                machine: machine.to_string(),
                phase,
                kind: alarm.kind,
                start: alarm.timestamp,
                end: alarm.timestamp,
                samples: 1,
                peak_excursion: excursion(alarm),
            }),
        }
        last_index = Some(alarm.index);
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quantity;
    use chrono::{TimeZone, Utc};

    fn signal(values: &[f64]) -> PhaseSignal {
        PhaseSignal::from_values(
            Phase::A,
            Quantity::Voltage,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            1.0,
            values.iter().copied(),
        )
        .expect("valid rate")
    }

    #[test]
    fn test_reference_scenario() {
        let sig = signal(&[118.0, 119.0, 125.0, 141.0, 142.0, 130.0]);
        let alarms = evaluate(&sig, 120.0, 140.0).unwrap();

        let got: Vec<(usize, f64, AlarmKind)> = alarms.iter().map(|a| (a.index, a.value, a.kind)).collect();
        assert_eq!(
            got,
            vec![
                (0, 118.0, AlarmKind::Below),
                (1, 119.0, AlarmKind::Below),
                (3, 141.0, AlarmKind::Above),
                (4, 142.0, AlarmKind::Above),
            ]
        );
        assert_eq!(alarms[2].timestamp, sig.samples[3].timestamp);
        assert_eq!(severity(&alarms), SeverityIndicator::Moderate);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let sig = signal(&[120.0, 140.0, 119.999, 140.001]);
        let alarms = evaluate(&sig, 120.0, 140.0).unwrap();
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[0].index, 2);
        assert_eq!(alarms[1].index, 3);
    }

    #[test]
    fn test_order_is_chronological_not_grouped() {
        let sig = signal(&[150.0, 100.0, 150.0, 100.0]);
        let kinds: Vec<_> = evaluate(&sig, 120.0, 140.0).unwrap().iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlarmKind::Above, AlarmKind::Below, AlarmKind::Above, AlarmKind::Below]
        );
    }

    #[test]
    fn test_invalid_ranges() {
        let sig = signal(&[130.0]);
        for (min, max, expected) in [
            (140.0, 120.0, RangeViolation::MinNotBelowMax),
            (130.0, 130.0, RangeViolation::MinNotBelowMax),
            (f64::NAN, 130.0, RangeViolation::MinNotFinite),
            (120.0, f64::INFINITY, RangeViolation::MaxNotFinite),
        ] {
            match evaluate(&sig, min, max) {
                Err(AlarmError::InvalidRange { violation, .. }) => assert_eq!(violation, expected),
                other => panic!("expected InvalidRange for ({min}, {max}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_error_message_names_bound() {
        let err = validate_range(150.0, 140.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("minimum voltage 150"), "{}", msg);
        assert!(msg.contains("maximum voltage 140"), "{}", msg);
    }

    #[test]
    fn test_nan_samples_not_emitted() {
        let sig = signal(&[f64::NAN, 100.0]);
        let alarms = evaluate(&sig, 120.0, 140.0).unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].index, 1);
    }

    #[test]
    fn test_severity_boundaries() {
        let below = |n: usize| evaluate(&signal(&vec![100.0; n]), 120.0, 140.0).unwrap();
        assert_eq!(severity(&below(0)), SeverityIndicator::None);
        assert_eq!(severity(&below(1)), SeverityIndicator::Moderate);
        assert_eq!(severity(&below(20)), SeverityIndicator::Moderate);
        assert_eq!(severity(&below(21)), SeverityIndicator::Severe);
        assert_eq!(severity(&below(25)), SeverityIndicator::Severe);
    }

    #[test]
    fn test_incident_runs() {
        let sig = signal(&[110.0, 112.0, 130.0, 150.0, 145.0, 100.0, 130.0]);
        let thresholds = ThresholdConfig::default();
        let alarms = evaluate_with(&sig, &thresholds).unwrap();
        let runs = incidents("Machine 1", Phase::A, &alarms, &thresholds);

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].kind, AlarmKind::Below);
        assert_eq!(runs[0].samples, 2);
        assert!((runs[0].peak_excursion - 10.0).abs() < 1e-9);
        assert_eq!(runs[1].kind, AlarmKind::Above);
        assert_eq!(runs[1].samples, 2);
        assert!((runs[1].peak_excursion - 10.0).abs() < 1e-9);
        assert_eq!(runs[1].start, sig.samples[3].timestamp);
        assert_eq!(runs[1].end, sig.samples[4].timestamp);
        // Above → Below with no gap still splits
        assert_eq!(runs[2].kind, AlarmKind::Below);
        assert_eq!(runs[2].samples, 1);
    }
}
