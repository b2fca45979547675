//! Cross-machine comparison statistics

use statrs::statistics::Statistics;

use crate::types::{MachineProfile, MachineSummary, MetricsPolicy};

/// Arithmetic mean; 0.0 for an empty population.
pub fn mean(population: &[f64]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().mean()
}

/// Percentage difference of `value` from the population mean.
///
/// `(value - mean) / (mean + ε) · 100` with the default ε, which keeps a zero
/// mean from dividing by zero. A mean of exactly `-ε` still does. An empty
/// population has nothing to compare against and yields 0.0.
pub fn delta_pct(value: f64, population: &[f64]) -> f64 {
    delta_pct_with(value, population, &MetricsPolicy::default())
}

pub fn delta_pct_with(value: f64, population: &[f64], policy: &MetricsPolicy) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let m = mean(population);
    (value - m) / (m + policy.mean_epsilon) * 100.0
}

/// Annotate every machine with its deltas against the fleet mean.
pub fn summarize(profiles: &[MachineProfile], policy: &MetricsPolicy) -> Vec<MachineSummary> {
    let reliability: Vec<f64> = profiles.iter().map(|p| p.reliability_pct).collect();
    let hours: Vec<f64> = profiles.iter().map(|p| p.operating_hours).collect();
    let faults: Vec<f64> = profiles.iter().map(|p| f64::from(p.fault_count)).collect();

    profiles
        .iter()
        .map(|p| MachineSummary {
            name: p.name.clone(),
            reliability_pct: p.reliability_pct,
            reliability_delta_pct: delta_pct_with(p.reliability_pct, &reliability, policy),
            operating_hours: p.operating_hours,
            operating_hours_delta_pct: delta_pct_with(p.operating_hours, &hours, policy),
            fault_count: p.fault_count,
            fault_count_delta_pct: delta_pct_with(f64::from(p.fault_count), &faults, policy),
        })
        .collect()
}
