//! Monitor Configuration - thresholds, policies and synthesis parameters as TOML
//!
//! Every section implements `Default` with the stock dashboard values, so a
//! missing file or a partial file behaves exactly like the built-in setup.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::alarms;
use crate::synthesis::{ThreePhaseParams, WaveformParams};
use crate::types::{
    alarm_policy, MachineProfile, MetricsPolicy, SeverityPolicy, ThresholdConfig,
};

/// Environment variable pointing at a config file
pub const CONFIG_ENV_VAR: &str = "WEBDECK_CONFIG";
/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "monitor_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$WEBDECK_CONFIG` env var
/// 2. `./monitor_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Voltage alarm band
    #[serde(default)]
    pub thresholds: ThresholdSettings,

    /// Alarm-count buckets
    #[serde(default)]
    pub severity: SeveritySettings,

    /// Cross-machine comparison guard
    #[serde(default)]
    pub metrics: MetricsSettings,

    /// Signal generation
    #[serde(default)]
    pub synthesis: SynthesisSettings,

    /// Monitored machines
    #[serde(default)]
    pub fleet: FleetSettings,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WEBDECK_CONFIG` environment variable
    /// 2. `./monitor_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), machines = config.fleet.machines.len(), "Loaded monitor config from WEBDECK_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from WEBDECK_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "WEBDECK_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./monitor_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(machines = config.fleet.machines.len(), "Loaded monitor config from ./monitor_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./monitor_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No monitor_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text.
    ///
    /// Unknown keys are logged as warnings; they never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the effective configuration.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if let Err(e) = alarms::validate_range(self.thresholds.voltage_min_v, self.thresholds.voltage_max_v) {
            errors.push(format!("thresholds: {e}"));
        }

        let eps = self.metrics.mean_epsilon;
        if !eps.is_finite() || eps <= 0.0 {
            errors.push(format!("metrics.mean_epsilon = {eps} must be a positive number"));
        }

        if let Err(e) = self.synthesis.three_phase_params().validate() {
            errors.push(format!("synthesis: {e}"));
        }
        let jitter = self.synthesis.response_time_jitter_ms;
        if !jitter.is_finite() || jitter < 0.0 {
            errors.push(format!("synthesis.response_time_jitter_ms = {jitter} cannot be negative"));
        }
        if self.synthesis.start().is_none() {
            errors.push(format!(
                "synthesis.start_unix_s = {} is not a representable timestamp",
                self.synthesis.start_unix_s
            ));
        }

        let (fleet_errors, fleet_warnings) = super::validation::validate_fleet(&self.fleet.machines);
        errors.extend(fleet_errors);
        for w in &fleet_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    pub fn threshold_band(&self) -> ThresholdConfig {
        ThresholdConfig {
            min_v: self.thresholds.voltage_min_v,
            max_v: self.thresholds.voltage_max_v,
        }
    }

    pub fn severity_policy(&self) -> SeverityPolicy {
        SeverityPolicy {
            moderate_max: self.severity.moderate_max_alarms,
        }
    }

    pub fn metrics_policy(&self) -> MetricsPolicy {
        MetricsPolicy {
            mean_epsilon: self.metrics.mean_epsilon,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Thresholds / Policies
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSettings {
    #[serde(default = "default_voltage_min_v")]
    pub voltage_min_v: f64,
    #[serde(default = "default_voltage_max_v")]
    pub voltage_max_v: f64,
}

fn default_voltage_min_v() -> f64 {
    alarm_policy::DEFAULT_VOLTAGE_MIN_V
}
fn default_voltage_max_v() -> f64 {
    alarm_policy::DEFAULT_VOLTAGE_MAX_V
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            voltage_min_v: default_voltage_min_v(),
            voltage_max_v: default_voltage_max_v(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeveritySettings {
    /// Highest alarm count still reported as Moderate
    #[serde(default = "default_moderate_max_alarms")]
    pub moderate_max_alarms: usize,
}

fn default_moderate_max_alarms() -> usize {
    alarm_policy::MODERATE_MAX_ALARMS
}

impl Default for SeveritySettings {
    fn default() -> Self {
        Self {
            moderate_max_alarms: default_moderate_max_alarms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSettings {
    #[serde(default = "default_mean_epsilon")]
    pub mean_epsilon: f64,
}

fn default_mean_epsilon() -> f64 {
    alarm_policy::MEAN_EPSILON
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            mean_epsilon: default_mean_epsilon(),
        }
    }
}

// ============================================================================
// Synthesis
// ============================================================================

/// Shape of one synthesized quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaveformSettings {
    pub amplitude: f64,
    pub dc_offset: f64,
    #[serde(default)]
    pub harmonic3_ratio: f64,
    #[serde(default)]
    pub harmonic5_ratio: f64,
    #[serde(default)]
    pub noise_std: f64,
}

impl WaveformSettings {
    fn from_params(p: &WaveformParams) -> Self {
        Self {
            amplitude: p.base_amplitude,
            dc_offset: p.dc_offset,
            harmonic3_ratio: p.harmonic3_ratio,
            harmonic5_ratio: p.harmonic5_ratio,
            noise_std: p.noise_std,
        }
    }
}

fn default_voltage_waveform() -> WaveformSettings {
    WaveformSettings::from_params(&WaveformParams::voltage_default())
}
fn default_current_waveform() -> WaveformSettings {
    WaveformSettings::from_params(&WaveformParams::current_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisSettings {
    /// Base seed; each machine derives its own stream from it
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// First sample time (Unix seconds)
    #[serde(default = "default_start_unix_s")]
    pub start_unix_s: i64,
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: f64,
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    #[serde(default = "default_fundamental_hz")]
    pub fundamental_hz: f64,
    #[serde(default = "default_power_factor")]
    pub power_factor: f64,
    #[serde(default = "default_response_time_jitter_ms")]
    pub response_time_jitter_ms: f64,
    #[serde(default = "default_voltage_waveform")]
    pub voltage: WaveformSettings,
    #[serde(default = "default_current_waveform")]
    pub current: WaveformSettings,
}

fn default_seed() -> u64 {
    2024
}
fn default_start_unix_s() -> i64 {
    // 2024-01-01T00:00:00Z
    1_704_067_200
}
fn default_sample_rate_hz() -> f64 {
    WaveformParams::voltage_default().sample_rate
}
fn default_n_samples() -> usize {
    WaveformParams::voltage_default().n_samples
}
fn default_fundamental_hz() -> f64 {
    WaveformParams::voltage_default().fundamental_hz
}
fn default_power_factor() -> f64 {
    alarm_policy::DEFAULT_POWER_FACTOR
}
fn default_response_time_jitter_ms() -> f64 {
    6.0
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            start_unix_s: default_start_unix_s(),
            sample_rate_hz: default_sample_rate_hz(),
            n_samples: default_n_samples(),
            fundamental_hz: default_fundamental_hz(),
            power_factor: default_power_factor(),
            response_time_jitter_ms: default_response_time_jitter_ms(),
            voltage: default_voltage_waveform(),
            current: default_current_waveform(),
        }
    }
}

impl SynthesisSettings {
    /// Timestamp of the first sample
    pub fn start(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.start_unix_s, 0).single()
    }

    /// Generator parameters shared by every machine (before per-machine overrides)
    pub fn three_phase_params(&self) -> ThreePhaseParams {
        let waveform = |w: &WaveformSettings| WaveformParams {
            n_samples: self.n_samples,
            sample_rate: self.sample_rate_hz,
            fundamental_hz: self.fundamental_hz,
            base_amplitude: w.amplitude,
            harmonic3_ratio: w.harmonic3_ratio,
            harmonic5_ratio: w.harmonic5_ratio,
            noise_std: w.noise_std,
            dc_offset: w.dc_offset,
            phase_offset_rad: 0.0,
        };

        ThreePhaseParams {
            voltage: waveform(&self.voltage),
            current: waveform(&self.current),
            voltage_noise_override: [None; 3],
            current_noise_override: [None; 3],
            power_factor: self.power_factor,
        }
    }
}

// ============================================================================
// Fleet
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetSettings {
    #[serde(default = "MachineProfile::default_fleet")]
    pub machines: Vec<MachineProfile>,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            machines: MachineProfile::default_fleet(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold_band(), ThresholdConfig::default());
        assert_eq!(config.severity_policy(), SeverityPolicy::default());
        assert_eq!(config.fleet.machines.len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MonitorConfig::from_toml_str(
            r#"
[thresholds]
voltage_min_v = 115.0
"#,
        )
        .expect("partial config should load");
        assert_eq!(config.thresholds.voltage_min_v, 115.0);
        assert_eq!(config.thresholds.voltage_max_v, 140.0);
        assert_eq!(config.synthesis, SynthesisSettings::default());
    }

    #[test]
    fn test_inverted_band_rejected() {
        let err = MonitorConfig::from_toml_str(
            r#"
[thresholds]
voltage_min_v = 150.0
voltage_max_v = 140.0
"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("minimum voltage 150"), "{}", msg);
    }

    #[test]
    fn test_collects_multiple_errors() {
        let mut config = MonitorConfig::default();
        config.metrics.mean_epsilon = 0.0;
        config.synthesis.n_samples = 0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2, "{:?}", errors),
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let config = MonitorConfig::default();
        let text = config.to_toml().expect("serialize");
        let back = MonitorConfig::from_toml_str(&text).expect("reload");
        assert_eq!(config, back);
    }

    #[test]
    fn test_default_start_timestamp() {
        let start = SynthesisSettings::default().start().expect("valid start");
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
