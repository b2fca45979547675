//! Shared data structures for the machine monitor
//!
//! This module defines the value types that flow through the pipeline:
//! - Synthesis: PhaseSignal, PowerTriplet, MachineSignals
//! - Alarms: ThresholdConfig, AlarmRecord, SeverityIndicator, Incident
//! - Fleet: MachineProfile, MachineSummary

mod alarm;
mod fleet;
mod signal;
pub mod thresholds;

pub use alarm::*;
pub use fleet::*;
pub use signal::*;
pub use thresholds::*;
