//! Fleet Integration Tests
//!
//! End-to-end runs of the fleet pipeline built from configuration, including
//! per-machine overrides, the checks table and the text renderings.

use webdeck_monitor::fleet::{self, FleetMonitor};
use webdeck_monitor::metrics;
use webdeck_monitor::types::{Phase, Quantity, SeverityIndicator, ThresholdConfig};
use webdeck_monitor::MonitorConfig;

fn config_with_samples(n_samples: usize) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.synthesis.n_samples = n_samples;
    config
}

#[test]
fn default_fleet_report_matches_profiles() {
    let config = config_with_samples(480);
    let monitor = FleetMonitor::from_config(&config).unwrap();
    let report = monitor.report(&config.threshold_band()).unwrap();

    assert_eq!(report.overview.machine_count, 3);
    let names: Vec<&str> = report.machines.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["Machine 1", "Machine 2", "Machine 3"]);

    let reliability: Vec<f64> = config.fleet.machines.iter().map(|m| m.reliability_pct).collect();
    let expected = metrics::delta_pct(99.8, &reliability);
    assert!((report.machines[0].summary.reliability_delta_pct - expected).abs() < 1e-12);

    let deltas: f64 = report.machines.iter().map(|m| m.summary.operating_hours_delta_pct).sum();
    assert!(deltas.abs() < 1e-6, "Deltas around the mean should cancel, got {deltas}");
}

#[test]
fn noisy_phase_raises_more_alarms() {
    // Machine 2 carries a 4 V noise override on phase B
    let config = config_with_samples(1920);
    let monitor = FleetMonitor::from_config(&config).unwrap();
    let band = ThresholdConfig { min_v: 114.0, max_v: 140.0 };
    let phases = monitor.phase_alarms("Machine 2", &band).unwrap();

    let count = |p: Phase| phases.iter().find(|x| x.phase == p).map_or(0, |x| x.alarms.len());
    assert!(
        count(Phase::B) > count(Phase::A),
        "phase B {} vs phase A {}",
        count(Phase::B),
        count(Phase::A)
    );
}

#[test]
fn wide_band_means_full_uptime_and_no_incidents() {
    let monitor = FleetMonitor::from_config(&config_with_samples(240)).unwrap();
    let report = monitor.report(&ThresholdConfig { min_v: 0.0, max_v: 1000.0 }).unwrap();

    assert_eq!(report.overview.uptime_pct, 100.0);
    assert_eq!(report.overview.incident_count, 0);
    assert_eq!(report.overview.worst_severity, SeverityIndicator::None);
    assert!(fleet::format_incidents(&report.incidents()).starts_with("No incidents recorded"));
}

#[test]
fn narrow_band_is_severe_everywhere() {
    let monitor = FleetMonitor::from_config(&config_with_samples(240)).unwrap();
    let report = monitor.report(&ThresholdConfig { min_v: 126.9, max_v: 127.1 }).unwrap();

    assert!(report.overview.uptime_pct < 5.0);
    assert!(report.machines.iter().all(|m| m.worst_severity == SeverityIndicator::Severe));
    let incidents = report.incidents();
    assert_eq!(incidents.len(), report.overview.incident_count);
    assert!(incidents.windows(2).all(|w| w[0].start <= w[1].start));
}

#[test]
fn seed_changes_samples_but_not_shape() {
    let config = config_with_samples(240);
    let a = FleetMonitor::from_config(&config).unwrap();
    let b = FleetMonitor::from_config(&config).unwrap().with_seed(config.synthesis.seed + 1);

    let sa = a.signals("Machine 1").unwrap();
    let sb = b.signals("Machine 1").unwrap();
    assert_eq!(sa.len(), sb.len());
    assert_ne!(sa.phases[0].voltage.values(), sb.phases[0].voltage.values());
}

#[test]
fn response_times_are_non_negative_and_near_base() {
    let monitor = FleetMonitor::from_config(&config_with_samples(960)).unwrap();
    let signals = monitor.signals("Machine 3").unwrap();
    let values: Vec<f64> = signals.response_time_ms.iter().map(|s| s.value).collect();

    assert!(values.iter().all(|&v| v >= 0.0));
    let mean = metrics::mean(&values);
    assert!((mean - 38.0).abs() < 2.0, "mean response {mean} ms");
}

#[test]
fn spectrum_through_the_monitor_is_memoized() {
    let monitor = FleetMonitor::from_config(&config_with_samples(1920)).unwrap();
    let first = monitor.spectrum("Machine 1", Phase::A, Quantity::Voltage).unwrap();
    let second = monitor.spectrum("machine 1", Phase::A, Quantity::Voltage).unwrap();

    assert_eq!(first, second);
    assert_eq!(monitor.cache().stats().spectrum_hits, 1);
    let (peak, _) = webdeck_monitor::processing::dominant_frequency(&first).unwrap();
    assert!((peak - 60.0).abs() < 1e-9);
}

#[test]
fn checks_table_and_overview_render() {
    let config = config_with_samples(120);
    let monitor = FleetMonitor::from_config(&config).unwrap();
    let band = config.threshold_band();

    let rows = monitor.checks(&band).unwrap();
    assert_eq!(rows.len(), 360);
    let table = fleet::format_checks(&rows, 3);
    assert!(table.lines().next().unwrap().starts_with("machine"));
    assert_eq!(table.matches("...").count(), 3);

    let overview = fleet::format_overview(&monitor.report(&band).unwrap());
    assert!(overview.contains("Machine 2"));
    assert!(overview.contains("Uptime:"));
}

#[test]
fn report_serializes_to_json() {
    let monitor = FleetMonitor::from_config(&config_with_samples(60)).unwrap();
    let report = monitor.report(&ThresholdConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["machines"].as_array().map(Vec::len), Some(3));
    assert!(json["overview"]["uptime_pct"].is_number());
}
