//! Monitor Configuration Module
//!
//! Provides configuration loaded from TOML files, covering the voltage band,
//! severity and metrics policies, synthesis parameters and the machine list.
//!
//! ## Loading Order
//!
//! 1. `WEBDECK_CONFIG` environment variable (path to TOML file)
//! 2. `monitor_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(MonitorConfig::load());
//!
//! // Anywhere in the codebase:
//! let band = config::get().threshold_band();
//! ```
//!
//! The live, user-editable threshold band is not part of this static config;
//! it lives in a [`ThresholdStore`] seeded from it.

mod monitor_config;
mod threshold_store;
pub mod validation;

pub use monitor_config::*;
pub use threshold_store::ThresholdStore;

use std::sync::OnceLock;

/// Global monitor configuration, initialized once at startup.
static MONITOR_CONFIG: OnceLock<MonitorConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: MonitorConfig) {
    if MONITOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Panics if `init()` has not been called; a missing config is a startup bug.
pub fn get() -> &'static MonitorConfig {
    MONITOR_CONFIG
        .get()
        .expect("config::get() called before config::init()")
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    MONITOR_CONFIG.get().is_some()
}
