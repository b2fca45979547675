//! Fleet pipeline - per-machine signals, alarms and KPIs
//!
//! Ties the stages together for every configured machine:
//!
//! ```text
//! MachineProfile ─► MachineRequest ─► SignalCache ─► alarms::evaluate ─► MachineReport
//!                                          │                                  │
//!                                          └─► processing::analyze            └─► FleetOverview
//! ```
//!
//! Machines are processed in parallel with rayon. Each machine draws from its
//! own RNG seeded by (base seed, machine index), so reports do not depend on
//! scheduling.

mod format;
mod report;

pub use format::*;
pub use report::*;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::alarms::{self, AlarmError};
use crate::cache::SignalCache;
use crate::config::MonitorConfig;
use crate::metrics;
use crate::processing::{ProcessingError, Spectrum};
use crate::synthesis::{machine_seed, MachineRequest, SynthesisError, ThreePhaseParams};
use crate::types::{
    MachineProfile, MachineSignals, MetricsPolicy, Phase, Quantity, SeverityPolicy, ThresholdConfig,
};

/// Errors in the fleet pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FleetError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Alarm(#[from] AlarmError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error("Unknown machine '{0}'")]
    UnknownMachine(String),

    #[error("Machine '{machine}' has no phase {phase}")]
    MissingPhase { machine: String, phase: Phase },

    #[error("Start timestamp {0} is out of range")]
    InvalidStart(i64),
}

// ============================================================================
// Fleet Monitor
// ============================================================================

pub struct FleetMonitor {
    params: ThreePhaseParams,
    seed: u64,
    start: DateTime<Utc>,
    response_time_jitter_ms: f64,
    machines: Vec<MachineProfile>,
    severity: SeverityPolicy,
    metrics: MetricsPolicy,
    cache: SignalCache,
}

impl FleetMonitor {
    pub fn from_config(config: &MonitorConfig) -> Result<Self, FleetError> {
        let synthesis = &config.synthesis;
        let start = synthesis
            .start()
            .ok_or(FleetError::InvalidStart(synthesis.start_unix_s))?;
        let params = synthesis.three_phase_params();
        params.validate()?;

        info!(
            machines = config.fleet.machines.len(),
            seed = synthesis.seed,
            n_samples = synthesis.n_samples,
            sample_rate_hz = synthesis.sample_rate_hz,
            "Fleet monitor ready"
        );

        Ok(Self {
            params,
            seed: synthesis.seed,
            start,
            response_time_jitter_ms: synthesis.response_time_jitter_ms,
            machines: config.fleet.machines.clone(),
            severity: config.severity_policy(),
            metrics: config.metrics_policy(),
            cache: SignalCache::new(),
        })
    }

    /// Replace the base seed. Cached entries stay valid since keys carry the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn machines(&self) -> &[MachineProfile] {
        &self.machines
    }

    pub fn cache(&self) -> &SignalCache {
        &self.cache
    }

    fn position(&self, machine: &str) -> Result<usize, FleetError> {
        let wanted = machine.trim();
        self.machines
            .iter()
            .position(|m| m.name.trim().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FleetError::UnknownMachine(machine.to_string()))
    }

    fn request_at(&self, index: usize) -> MachineRequest {
        let profile = &self.machines[index];
        let mut params = self.params;
        params.voltage_noise_override = profile.voltage_noise.as_array();

        MachineRequest {
            machine: profile.name.clone(),
            params,
            response_time_base_ms: profile.response_time_base_ms,
            response_time_jitter_ms: self.response_time_jitter_ms,
            seed: machine_seed(self.seed, index),
            start: self.start,
        }
    }

    /// Generation request for a machine, looked up by name (case-insensitive).
    pub fn request(&self, machine: &str) -> Result<MachineRequest, FleetError> {
        Ok(self.request_at(self.position(machine)?))
    }

    pub fn signals(&self, machine: &str) -> Result<Arc<MachineSignals>, FleetError> {
        self.cache.get_or_generate(&self.request(machine)?)
    }

    pub fn spectrum(&self, machine: &str, phase: Phase, quantity: Quantity) -> Result<Arc<Spectrum>, FleetError> {
        self.cache.spectrum(&self.request(machine)?, phase, quantity)
    }

    /// Voltage alarms and severity for each phase of one machine.
    pub fn phase_alarms(&self, machine: &str, thresholds: &ThresholdConfig) -> Result<Vec<PhaseAlarms>, FleetError> {
        let signals = self.signals(machine)?;
        evaluate_phases(&signals, thresholds, &self.severity)
    }

    /// Full fleet report under `thresholds`.
    pub fn report(&self, thresholds: &ThresholdConfig) -> Result<FleetReport, FleetError> {
        alarms::validate_range(thresholds.min_v, thresholds.max_v)?;
        let summaries = metrics::summarize(&self.machines, &self.metrics);

        let machines = summaries
            .into_par_iter()
            .enumerate()
            .map(|(index, summary)| {
                let signals = self.cache.get_or_generate(&self.request_at(index))?;
                build_machine_report(&signals, summary, thresholds, &self.severity)
            })
            .collect::<Result<Vec<_>, FleetError>>()?;

        let report = FleetReport::new(*thresholds, machines);
        info!(
            machines = report.machines.len(),
            uptime_pct = report.overview.uptime_pct,
            incidents = report.overview.incident_count,
            worst = %report.overview.worst_severity,
            "Fleet report built"
        );
        Ok(report)
    }

    /// Every machine's samples as one table, in fleet order.
    pub fn checks(&self, thresholds: &ThresholdConfig) -> Result<Vec<CheckRow>, FleetError> {
        alarms::validate_range(thresholds.min_v, thresholds.max_v)?;

        let per_machine = (0..self.machines.len())
            .into_par_iter()
            .map(|index| {
                let signals = self.cache.get_or_generate(&self.request_at(index))?;
                let phases = evaluate_phases(&signals, thresholds, &self.severity)?;
                Ok(check_rows(&signals, &alarm_mask(signals.len(), &phases)))
            })
            .collect::<Result<Vec<_>, FleetError>>()?;

        let rows: Vec<CheckRow> = per_machine.into_iter().flatten().collect();
        debug!(rows = rows.len(), "Built checks table");
        Ok(rows)
    }
}

fn evaluate_phases(
    signals: &MachineSignals,
    thresholds: &ThresholdConfig,
    policy: &SeverityPolicy,
) -> Result<Vec<PhaseAlarms>, FleetError> {
    signals
        .phases
        .iter()
        .map(|channels| {
            let alarms = alarms::evaluate_with(&channels.voltage, thresholds)?;
            Ok(PhaseAlarms {
                phase: channels.phase,
                severity: alarms::severity_with(&alarms, policy),
                alarms,
            })
        })
        .collect()
}
