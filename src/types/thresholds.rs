//! Voltage band, severity policy and metrics policy

use serde::{Deserialize, Serialize};

/// Default alarm and metrics policy values
pub mod alarm_policy {
    /// Default lower voltage bound (V)
    pub const DEFAULT_VOLTAGE_MIN_V: f64 = 120.0;
    /// Default upper voltage bound (V)
    pub const DEFAULT_VOLTAGE_MAX_V: f64 = 140.0;

    /// Highest alarm count that is still Moderate; one more is Severe
    pub const MODERATE_MAX_ALARMS: usize = 20;

    /// Added to the fleet mean before dividing in percentage deltas
    pub const MEAN_EPSILON: f64 = 1e-9;

    /// Power factor used when deriving active/reactive power
    pub const DEFAULT_POWER_FACTOR: f64 = 0.92;
}

/// Allowed voltage band. Samples outside `[min_v, max_v]` raise alarms.
///
/// The evaluator revalidates the band on every call, so a hand-built value
/// with `min_v >= max_v` is rejected there rather than trusted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdConfig {
    pub min_v: f64,
    pub max_v: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_v: alarm_policy::DEFAULT_VOLTAGE_MIN_V,
            max_v: alarm_policy::DEFAULT_VOLTAGE_MAX_V,
        }
    }
}

impl std::fmt::Display for ThresholdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.1} V, {:.1} V]", self.min_v, self.max_v)
    }
}

/// Three-level alarm volume classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityIndicator {
    #[default]
    None,
    Moderate,
    Severe,
}

impl SeverityIndicator {
    /// Status glyph shown next to a machine
    pub fn glyph(self) -> &'static str {
        match self {
            SeverityIndicator::None => "🟢",
            SeverityIndicator::Moderate => "🟡",
            SeverityIndicator::Severe => "🔴",
        }
    }
}

impl std::fmt::Display for SeverityIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityIndicator::None => write!(f, "NONE"),
            SeverityIndicator::Moderate => write!(f, "MODERATE"),
            SeverityIndicator::Severe => write!(f, "SEVERE"),
        }
    }
}

/// Alarm-count buckets for [`SeverityIndicator`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityPolicy {
    /// Counts in `1..=moderate_max` are Moderate, anything above is Severe
    pub moderate_max: usize,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            moderate_max: alarm_policy::MODERATE_MAX_ALARMS,
        }
    }
}

impl SeverityPolicy {
    pub fn classify(&self, alarm_count: usize) -> SeverityIndicator {
        match alarm_count {
            0 => SeverityIndicator::None,
            n if n <= self.moderate_max => SeverityIndicator::Moderate,
            _ => SeverityIndicator::Severe,
        }
    }
}

/// Numeric guard for cross-machine comparisons
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricsPolicy {
    pub mean_epsilon: f64,
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        Self {
            mean_epsilon: alarm_policy::MEAN_EPSILON,
        }
    }
}
