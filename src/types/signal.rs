//! Phase signals and derived power quantities

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Phase / Quantity
// ============================================================================

/// Electrical phase of a three-phase feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    /// All phases in display order
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    /// Nominal angular offset of this phase (radians).
    ///
    /// A leads at 0, B lags by 120°, C leads by 120° (ABC rotation).
    pub fn angle_rad(self) -> f64 {
        use std::f64::consts::PI;
        match self {
            Phase::A => 0.0,
            Phase::B => -2.0 * PI / 3.0,
            Phase::C => 2.0 * PI / 3.0,
        }
    }

    /// Position of the phase in [`Phase::ALL`]
    pub fn index(self) -> usize {
        match self {
            Phase::A => 0,
            Phase::B => 1,
            Phase::C => 2,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::A => write!(f, "A"),
            Phase::B => write!(f, "B"),
            Phase::C => write!(f, "C"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Phase::A),
            "B" => Ok(Phase::B),
            "C" => Ok(Phase::C),
            other => Err(format!("unknown phase '{other}' (expected A, B or C)")),
        }
    }
}

/// Measured quantity carried by a [`PhaseSignal`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Volts
    Voltage,
    /// Amperes
    Current,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::Voltage => write!(f, "voltage"),
            Quantity::Current => write!(f, "current"),
        }
    }
}

impl std::str::FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voltage" | "v" => Ok(Quantity::Voltage),
            "current" | "i" => Ok(Quantity::Current),
            other => Err(format!("unknown quantity '{other}' (expected voltage or current)")),
        }
    }
}

// ============================================================================
// PhaseSignal
// ============================================================================

/// One timestamped reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Uniformly sampled time series for one phase and one quantity.
///
/// Timestamps are `start + i * interval` with a whole-nanosecond interval, so
/// they are strictly increasing and evenly spaced by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseSignal {
    pub phase: Phase,
    pub quantity: Quantity,
    /// Sampling rate in Hz
    pub sample_rate: f64,
    pub samples: Vec<Sample>,
}

impl PhaseSignal {
    /// Build a signal from raw values.
    ///
    /// Returns `None` when the sampling interval does not resolve to at least
    /// one nanosecond (non-positive, non-finite or absurdly high rates), or
    /// when a timestamp would fall outside the representable range.
    pub fn from_values(
        phase: Phase,
        quantity: Quantity,
        start: DateTime<Utc>,
        sample_rate: f64,
        values: impl IntoIterator<Item = f64>,
    ) -> Option<Self> {
        let step = interval_nanos(sample_rate)?;
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let offset = i64::try_from(i).ok()?.checked_mul(step)?;
                Some(Sample {
                    timestamp: start.checked_add_signed(Duration::nanoseconds(offset))?,
                    value,
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            phase,
            quantity,
            sample_rate,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw values in chronological order (for spectrum analysis)
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// First timestamp, if any
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }
}

/// Sampling interval for a rate in Hz, rounded to whole nanoseconds.
pub fn sample_interval(sample_rate: f64) -> Option<Duration> {
    interval_nanos(sample_rate).map(Duration::nanoseconds)
}

/// Time from the first to the last of `n_samples` samples.
///
/// `None` when the rate is unusable or the span overflows.
pub fn sample_span(sample_rate: f64, n_samples: usize) -> Option<Duration> {
    let step = interval_nanos(sample_rate)?;
    let last = i64::try_from(n_samples.saturating_sub(1)).ok()?;
    step.checked_mul(last).map(Duration::nanoseconds)
}

fn interval_nanos(sample_rate: f64) -> Option<i64> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return None;
    }
    let nanos = (1e9 / sample_rate).round();
    // Below 1 ns the timestamps would stop increasing
    if nanos < 1.0 || nanos > i64::MAX as f64 {
        return None;
    }
    Some(nanos as i64)
}

// ============================================================================
// Power
// ============================================================================

/// Active / reactive / apparent power for one phase at one instant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerTriplet {
    pub timestamp: DateTime<Utc>,
    /// W
    pub active: f64,
    /// var
    pub reactive: f64,
    /// VA
    pub apparent: f64,
}

impl PowerTriplet {
    /// Derive power from instantaneous voltage, current and a fixed power factor.
    ///
    /// `power_factor` must lie in [0, 1]; the synthesizer validates it before
    /// calling this.
    pub fn from_readings(timestamp: DateTime<Utc>, volts: f64, amps: f64, power_factor: f64) -> Self {
        let apparent = volts * amps;
        Self {
            timestamp,
            active: apparent * power_factor,
            reactive: apparent * power_factor.acos().sin(),
            apparent,
        }
    }
}

/// Voltage, current and power series for one phase of one machine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseChannels {
    pub phase: Phase,
    pub voltage: PhaseSignal,
    pub current: PhaseSignal,
    pub power: Vec<PowerTriplet>,
}

impl PhaseChannels {
    /// Select the signal for a quantity
    pub fn signal(&self, quantity: Quantity) -> &PhaseSignal {
        match quantity {
            Quantity::Voltage => &self.voltage,
            Quantity::Current => &self.current,
        }
    }
}

/// Everything the synthesizer produces for one machine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineSignals {
    pub machine: String,
    /// Always ordered A, B, C
    pub phases: Vec<PhaseChannels>,
    /// Synthetic check response times (ms), same timestamps as the phases
    pub response_time_ms: Vec<Sample>,
}

impl MachineSignals {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseChannels> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Number of timestamps in the table
    pub fn len(&self) -> usize {
        self.phases.first().map_or(0, |p| p.voltage.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
