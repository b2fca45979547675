//! WebDeck: Machine Monitor Core
//!
//! Synthetic three-phase signal generation, spectrum analysis and voltage
//! threshold alarms for a small fleet of monitored machines.
//!
//! ## Architecture
//!
//! - **Synthesis**: Seeded voltage/current waveforms with harmonics and noise
//! - **Processing**: One-sided FFT magnitude spectra
//! - **Alarms**: Band evaluation, severity classification, incident grouping
//! - **Metrics**: Per-machine deltas against the fleet mean
//! - **Fleet**: Parallel per-machine pipeline and reports
//! - **Cache**: Content-addressed memoization of signals and spectra

pub mod alarms;
pub mod cache;
pub mod config;
pub mod fleet;
pub mod metrics;
pub mod processing;
pub mod synthesis;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, MonitorConfig, ThresholdStore};

// Re-export commonly used types
pub use types::{
    AlarmKind, AlarmRecord, Incident, MachineProfile, MachineSignals, MachineSummary,
    MetricsPolicy, Phase, PhaseSignal, Quantity, SeverityIndicator, SeverityPolicy,
    ThresholdConfig,
};

// Re-export stage entry points and errors
pub use alarms::AlarmError;
pub use cache::{CacheStats, SignalCache};
pub use fleet::{FleetError, FleetMonitor, FleetReport};
pub use processing::{ProcessingError, Spectrum};
pub use synthesis::{SynthesisError, ThreePhaseParams, WaveformParams};
