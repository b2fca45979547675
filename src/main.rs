//! WebDeck - machine monitor command line
//!
//! Generates the fleet's synthetic signals and prints overviews, alarms,
//! spectra and the checks table.
//!
//! # Usage
//!
//! ```bash
//! # Fleet KPIs and per-machine summaries
//! webdeck overview
//!
//! # Alarms for one machine under a custom band
//! webdeck alarms --machine "Machine 2" --min 118 --max 136
//!
//! # Voltage spectrum of phase B as JSON
//! webdeck --format json spectrum --machine "Machine 1" --phase B
//! ```
//!
//! # Environment Variables
//!
//! - `WEBDECK_CONFIG`: Path to a monitor_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use webdeck_monitor::config::{self, MonitorConfig, ThresholdStore};
use webdeck_monitor::fleet::{self, FleetMonitor};
use webdeck_monitor::processing;
use webdeck_monitor::types::{Phase, Quantity};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "webdeck")]
#[command(about = "WebDeck machine monitor: synthetic three-phase signals, spectra and voltage alarms")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config (takes precedence over WEBDECK_CONFIG and ./monitor_config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the synthesis seed from the config
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Fleet KPIs and per-machine summaries
    Overview,

    /// Voltage alarms and severity per phase for one machine
    Alarms {
        #[arg(long)]
        machine: String,
        /// Lower bound (V); requires --max
        #[arg(long, requires = "max", allow_negative_numbers = true)]
        min: Option<f64>,
        /// Upper bound (V); requires --min
        #[arg(long, requires = "min", allow_negative_numbers = true)]
        max: Option<f64>,
        /// Records listed per phase in text output
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Magnitude spectrum of one phase
    Spectrum {
        #[arg(long)]
        machine: String,
        #[arg(long, default_value = "A")]
        phase: Phase,
        #[arg(long, default_value = "voltage")]
        quantity: Quantity,
        /// Number of peaks listed in text output
        #[arg(long, default_value = "5")]
        top: usize,
    },

    /// Combined checks table of every machine
    Checks {
        /// Rows shown per machine in text output
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Voltage incidents across the fleet
    Incidents,

    /// Print the effective configuration as TOML
    Config,
}

// ============================================================================
// Helpers
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<MonitorConfig> {
    match path {
        Some(p) => {
            let config = MonitorConfig::load_from_file(p)
                .with_context(|| format!("Failed to load config from {}", p.display()))?;
            info!(path = %p.display(), "Loaded monitor config from --config");
            Ok(config)
        }
        None => Ok(MonitorConfig::load()),
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", text()),
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let mut monitor_config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        monitor_config.synthesis.seed = seed;
    }
    config::init(monitor_config);
    let cfg = config::get();

    let thresholds = ThresholdStore::new(cfg.threshold_band()).context("Configured threshold band is invalid")?;
    let monitor = FleetMonitor::from_config(cfg).context("Failed to set up fleet monitor")?;

    match args.command {
        SubCommand::Overview => {
            let report = monitor.report(&thresholds.current())?;
            emit(args.format, &report, || fleet::format_overview(&report))?;
        }

        SubCommand::Alarms { machine, min, max, limit } => {
            if let (Some(min), Some(max)) = (min, max) {
                if let Err(e) = thresholds.save(min, max) {
                    warn!("Keeping configured band {}: {}", thresholds.current(), e);
                    eprintln!("Invalid band: {e}. Using {} instead.", thresholds.current());
                }
            }
            let phases = monitor.phase_alarms(&machine, &thresholds.current())?;
            emit(args.format, &phases, || fleet::format_alarms(&machine, &phases, limit))?;
        }

        SubCommand::Spectrum { machine, phase, quantity, top } => {
            let spectrum = monitor.spectrum(&machine, phase, quantity)?;
            emit(args.format, spectrum.as_ref(), || {
                format!(
                    "{} phase {} {}\n{}",
                    machine,
                    phase,
                    quantity,
                    processing::format_spectrum(&spectrum, top)
                )
            })?;
        }

        SubCommand::Checks { limit } => {
            let rows = monitor.checks(&thresholds.current())?;
            emit(args.format, &rows, || fleet::format_checks(&rows, limit))?;
        }

        SubCommand::Incidents => {
            let incidents = monitor.report(&thresholds.current())?.incidents();
            emit(args.format, &incidents, || fleet::format_incidents(&incidents))?;
        }

        SubCommand::Config => {
            print!("{}", cfg.to_toml().context("Failed to render config")?);
        }
    }

    let stats = monitor.cache().stats();
    tracing::debug!(
        signal_hits = stats.signal_hits,
        signal_misses = stats.signal_misses,
        spectrum_misses = stats.spectrum_misses,
        "Cache usage"
    );
    Ok(())
}
