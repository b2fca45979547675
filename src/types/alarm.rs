//! Alarm records and incidents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Phase;

/// Which side of the band a sample fell on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlarmKind {
    Above,
    Below,
}

impl std::fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlarmKind::Above => write!(f, "ABOVE"),
            AlarmKind::Below => write!(f, "BELOW"),
        }
    }
}

/// One out-of-band sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AlarmRecord {
    /// Position of the sample in its signal
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub kind: AlarmKind,
}

/// A run of consecutive same-kind alarms on one phase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    pub machine: String,
    pub phase: Phase,
    pub kind: AlarmKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub samples: usize,
    /// Largest distance outside the band (V)
    pub peak_excursion: f64,
}
