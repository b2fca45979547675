//! Whole-machine generation from a self-contained request

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{generate_response_times, generate_three_phase, SynthesisError, ThreePhaseParams};
use crate::types::MachineSignals;

/// Everything needed to regenerate one machine's signals bit-for-bit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineRequest {
    pub machine: String,
    pub params: ThreePhaseParams,
    pub response_time_base_ms: f64,
    pub response_time_jitter_ms: f64,
    pub seed: u64,
    pub start: DateTime<Utc>,
}

/// Derive a per-machine seed so machines get independent noise streams.
pub fn machine_seed(base_seed: u64, machine_index: usize) -> u64 {
    base_seed ^ (machine_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Generate voltage, current, power and response times for one machine.
pub fn generate_machine(request: &MachineRequest) -> Result<MachineSignals, SynthesisError> {
    let mut rng = StdRng::seed_from_u64(request.seed);

    let phases = generate_three_phase(&request.params, request.start, &mut rng)?;
    let timestamps: Vec<DateTime<Utc>> = phases
        .first()
        .map(|p| p.voltage.samples.iter().map(|s| s.timestamp).collect())
        .unwrap_or_default();
    let response_time_ms = generate_response_times(
        &timestamps,
        request.response_time_base_ms,
        request.response_time_jitter_ms,
        &mut rng,
    )?;

    tracing::debug!(
        machine = %request.machine,
        seed = request.seed,
        samples = timestamps.len(),
        "Generated machine signals"
    );

    Ok(MachineSignals {
        machine: request.machine.clone(),
        phases,
        response_time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(seed: u64) -> MachineRequest {
        MachineRequest {
            machine: "Machine 1".to_string(),
            params: ThreePhaseParams::default(),
            response_time_base_ms: 40.0,
            response_time_jitter_ms: 5.0,
            seed,
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_reproducible_per_seed() {
        assert_eq!(generate_machine(&request(11)).unwrap(), generate_machine(&request(11)).unwrap());
        assert_ne!(generate_machine(&request(11)).unwrap(), generate_machine(&request(12)).unwrap());
    }

    #[test]
    fn test_response_times_share_timestamps() {
        let signals = generate_machine(&request(1)).unwrap();
        assert_eq!(signals.response_time_ms.len(), signals.len());
        assert_eq!(
            signals.response_time_ms[10].timestamp,
            signals.phases[2].voltage.samples[10].timestamp
        );
    }

    #[test]
    fn test_machine_seeds_differ() {
        assert_ne!(machine_seed(7, 0), machine_seed(7, 1));
        assert_eq!(machine_seed(7, 2), machine_seed(7, 2));
    }
}
