//! Content-addressed memoization of generated signals and their spectra
//!
//! Keys carry every generation input (floats by bit pattern), so two requests
//! that would produce the same samples share one entry. The core generators
//! and analysers stay uncached; this layer sits in front of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::fleet::FleetError;
use crate::processing::{self, Spectrum};
use crate::synthesis::{self, MachineRequest, WaveformParams};
use crate::types::{MachineSignals, Phase, Quantity};

// ============================================================================
// Keys
// ============================================================================

/// Identity of one machine generation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationKey {
    machine: String,
    seed: u64,
    start: DateTime<Utc>,
    bits: Vec<u64>,
}

impl GenerationKey {
    pub fn of(request: &MachineRequest) -> Self {
        let params = &request.params;
        let mut bits = Vec::with_capacity(32);
        push_waveform(&mut bits, &params.voltage);
        push_waveform(&mut bits, &params.current);
        for noise in params
            .voltage_noise_override
            .iter()
            .chain(params.current_noise_override.iter())
        {
            match noise {
                Some(n) => bits.extend([1, n.to_bits()]),
                None => bits.extend([0, 0]),
            }
        }
        bits.push(params.power_factor.to_bits());
        bits.push(request.response_time_base_ms.to_bits());
        bits.push(request.response_time_jitter_ms.to_bits());

        Self {
            machine: request.machine.clone(),
            seed: request.seed,
            start: request.start,
            bits,
        }
    }
}

fn push_waveform(bits: &mut Vec<u64>, p: &WaveformParams) {
    bits.extend([
        p.n_samples as u64,
        p.sample_rate.to_bits(),
        p.fundamental_hz.to_bits(),
        p.base_amplitude.to_bits(),
        p.harmonic3_ratio.to_bits(),
        p.harmonic5_ratio.to_bits(),
        p.noise_std.to_bits(),
        p.dc_offset.to_bits(),
        p.phase_offset_rad.to_bits(),
    ]);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpectrumKey {
    generation: GenerationKey,
    phase: Phase,
    quantity: Quantity,
    sample_rate_bits: u64,
}

// ============================================================================
// Cache
// ============================================================================

/// Hit/miss counters across both maps
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStats {
    pub signal_hits: u64,
    pub signal_misses: u64,
    pub spectrum_hits: u64,
    pub spectrum_misses: u64,
    pub signal_entries: usize,
    pub spectrum_entries: usize,
}

#[derive(Default)]
pub struct SignalCache {
    signals: RwLock<HashMap<GenerationKey, Arc<MachineSignals>>>,
    spectra: RwLock<HashMap<SpectrumKey, Arc<Spectrum>>>,
    signal_hits: AtomicU64,
    signal_misses: AtomicU64,
    spectrum_hits: AtomicU64,
    spectrum_misses: AtomicU64,
}

impl SignalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached signals for `request`, generating them on a miss.
    pub fn get_or_generate(&self, request: &MachineRequest) -> Result<Arc<MachineSignals>, FleetError> {
        let key = GenerationKey::of(request);
        self.signals_for(key, request)
    }

    fn signals_for(&self, key: GenerationKey, request: &MachineRequest) -> Result<Arc<MachineSignals>, FleetError> {
        if let Some(hit) = self
            .signals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            self.signal_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(hit));
        }

        self.signal_misses.fetch_add(1, Ordering::Relaxed);
        let generated = Arc::new(synthesis::generate_machine(request)?);

        // A concurrent miss may have inserted first; keep whichever landed.
        let mut map = self.signals.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(map.entry(key).or_insert(generated)))
    }

    /// Spectrum of one phase/quantity of the machine described by `request`.
    pub fn spectrum(
        &self,
        request: &MachineRequest,
        phase: Phase,
        quantity: Quantity,
    ) -> Result<Arc<Spectrum>, FleetError> {
        let generation = GenerationKey::of(request);
        let sample_rate = match quantity {
            Quantity::Voltage => request.params.voltage.sample_rate,
            Quantity::Current => request.params.current.sample_rate,
        };
        let key = SpectrumKey {
            generation: generation.clone(),
            phase,
            quantity,
            sample_rate_bits: sample_rate.to_bits(),
        };

        if let Some(hit) = self
            .spectra
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            self.spectrum_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(hit));
        }

        self.spectrum_misses.fetch_add(1, Ordering::Relaxed);
        let signals = self.signals_for(generation, request)?;
        let channels = signals.phase(phase).ok_or_else(|| FleetError::MissingPhase {
            machine: request.machine.clone(),
            phase,
        })?;
        let signal = channels.signal(quantity);
        let spectrum = Arc::new(processing::analyze(&signal.values(), signal.sample_rate)?);

        let mut map = self.spectra.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(map.entry(key).or_insert(spectrum)))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            signal_hits: self.signal_hits.load(Ordering::Relaxed),
            signal_misses: self.signal_misses.load(Ordering::Relaxed),
            spectrum_hits: self.spectrum_hits.load(Ordering::Relaxed),
            spectrum_misses: self.spectrum_misses.load(Ordering::Relaxed),
            signal_entries: self.signals.read().unwrap_or_else(PoisonError::into_inner).len(),
            spectrum_entries: self.spectra.read().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&self) {
        self.signals.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.spectra.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
