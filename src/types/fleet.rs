//! Per-machine profile and comparison summary

use serde::{Deserialize, Serialize};

/// Fixed (simulated) attributes of one monitored machine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineProfile {
    pub name: String,
    /// Reliability over the reporting window (%)
    pub reliability_pct: f64,
    pub operating_hours: f64,
    pub fault_count: u32,
    /// Centre of the synthetic check response-time series (ms)
    #[serde(default = "default_response_time_base_ms")]
    pub response_time_base_ms: f64,
    /// Per-phase voltage noise override (V std-dev)
    #[serde(default, skip_serializing_if = "PhaseNoise::is_empty")]
    pub voltage_noise: PhaseNoise,
}

/// Optional per-phase noise std-dev
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PhaseNoise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
}

impl PhaseNoise {
    pub fn is_empty(&self) -> bool {
        self.a.is_none() && self.b.is_none() && self.c.is_none()
    }

    /// A/B/C order, matching `Phase::index`
    pub fn as_array(&self) -> [Option<f64>; 3] {
        [self.a, self.b, self.c]
    }
}

fn default_response_time_base_ms() -> f64 {
    45.0
}

impl MachineProfile {
    pub fn new(name: impl Into<String>, reliability_pct: f64, operating_hours: f64, fault_count: u32) -> Self {
        Self {
            name: name.into(),
            reliability_pct,
            operating_hours,
            fault_count,
            response_time_base_ms: default_response_time_base_ms(),
            voltage_noise: PhaseNoise::default(),
        }
    }

    /// The three machines shown by the stock dashboard
    pub fn default_fleet() -> Vec<Self> {
        vec![
            Self {
                response_time_base_ms: 42.0,
                ..Self::new("Machine 1", 99.8, 1_820.0, 1)
            },
            Self {
                response_time_base_ms: 55.0,
                voltage_noise: PhaseNoise {
                    b: Some(4.0),
                    ..PhaseNoise::default()
                },
                ..Self::new("Machine 2", 98.6, 2_310.0, 4)
            },
            Self {
                response_time_base_ms: 38.0,
                ..Self::new("Machine 3", 99.3, 1_475.0, 2)
            },
        ]
    }
}

/// A machine's attributes with their deltas against the fleet mean (%)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineSummary {
    pub name: String,
    pub reliability_pct: f64,
    pub reliability_delta_pct: f64,
    pub operating_hours: f64,
    pub operating_hours_delta_pct: f64,
    pub fault_count: u32,
    pub fault_count_delta_pct: f64,
}
