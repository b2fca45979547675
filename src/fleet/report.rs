//! Report types for machines and the fleet

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FleetError;
use crate::alarms;
use crate::metrics;
use crate::types::{
    AlarmRecord, Incident, MachineSignals, MachineSummary, Phase, SeverityIndicator,
    SeverityPolicy, ThresholdConfig,
};

/// Voltage alarms raised on one phase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseAlarms {
    pub phase: Phase,
    pub alarms: Vec<AlarmRecord>,
    pub severity: SeverityIndicator,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineReport {
    pub summary: MachineSummary,
    pub phases: Vec<PhaseAlarms>,
    pub worst_severity: SeverityIndicator,
    pub incidents: Vec<Incident>,
    /// Share of timestamps with no voltage alarm on any phase (%)
    pub uptime_pct: f64,
    pub mean_response_ms: f64,
}

impl MachineReport {
    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn alarm_count(&self) -> usize {
        self.phases.iter().map(|p| p.alarms.len()).sum()
    }
}

/// Fleet-wide KPIs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetOverview {
    pub machine_count: usize,
    /// Mean of the machines' uptime (%)
    pub uptime_pct: f64,
    /// Mean over every response-time sample of every machine
    pub mean_response_ms: f64,
    pub incident_count: usize,
    pub alarm_count: usize,
    pub worst_severity: SeverityIndicator,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetReport {
    pub thresholds: ThresholdConfig,
    pub overview: FleetOverview,
    pub machines: Vec<MachineReport>,
}

impl FleetReport {
    pub fn new(thresholds: ThresholdConfig, machines: Vec<MachineReport>) -> Self {
        let uptimes: Vec<f64> = machines.iter().map(|m| m.uptime_pct).collect();
        // Every machine has the same sample count, so the mean of means is the pooled mean
        let responses: Vec<f64> = machines.iter().map(|m| m.mean_response_ms).collect();

        let overview = FleetOverview {
            machine_count: machines.len(),
            uptime_pct: if uptimes.is_empty() { 100.0 } else { metrics::mean(&uptimes) },
            mean_response_ms: metrics::mean(&responses),
            incident_count: machines.iter().map(|m| m.incidents.len()).sum(),
            alarm_count: machines.iter().map(MachineReport::alarm_count).sum(),
            worst_severity: machines
                .iter()
                .map(|m| m.worst_severity)
                .max()
                .unwrap_or_default(),
        };

        Self {
            thresholds,
            overview,
            machines,
        }
    }

    /// All incidents across the fleet, oldest first
    pub fn incidents(&self) -> Vec<Incident> {
        let mut all: Vec<Incident> = self
            .machines
            .iter()
            .flat_map(|m| m.incidents.iter().cloned())
            .collect();
        all.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.machine.cmp(&b.machine)));
        all
    }

    pub fn machine(&self, name: &str) -> Option<&MachineReport> {
        self.machines.iter().find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

/// One row of the combined checks table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckRow {
    pub machine: String,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: f64,
    pub voltage_a: f64,
    pub voltage_b: f64,
    pub voltage_c: f64,
    /// Any phase out of band at this timestamp
    pub in_alarm: bool,
}

// ============================================================================
// Builders
// ============================================================================

pub(super) fn build_machine_report(
    signals: &MachineSignals,
    summary: MachineSummary,
    thresholds: &ThresholdConfig,
    policy: &SeverityPolicy,
) -> Result<MachineReport, FleetError> {
    let phases = super::evaluate_phases(signals, thresholds, policy)?;

    let mut incidents: Vec<Incident> = phases
        .iter()
        .flat_map(|p| alarms::incidents(&signals.machine, p.phase, &p.alarms, thresholds))
        .collect();
    incidents.sort_by(|a, b| a.start.cmp(&b.start).then(a.phase.cmp(&b.phase)));

    let n = signals.len();
    let alarmed = alarm_mask(n, &phases).iter().filter(|&&a| a).count();
    let uptime_pct = if n == 0 {
        100.0
    } else {
        (n - alarmed) as f64 / n as f64 * 100.0
    };

    let response: Vec<f64> = signals.response_time_ms.iter().map(|s| s.value).collect();
    let worst_severity = phases.iter().map(|p| p.severity).max().unwrap_or_default();

    tracing::debug!(
        machine = %signals.machine,
        alarms = phases.iter().map(|p| p.alarms.len()).sum::<usize>(),
        incidents = incidents.len(),
        uptime_pct,
        "Machine report built"
    );

    Ok(MachineReport {
        summary,
        phases,
        worst_severity,
        incidents,
        uptime_pct,
        mean_response_ms: metrics::mean(&response),
    })
}

/// `mask[i]` is true when any phase alarmed at sample `i`.
pub(super) fn alarm_mask(n: usize, phases: &[PhaseAlarms]) -> Vec<bool> {
    let mut mask = vec![false; n];
    for alarm in phases.iter().flat_map(|p| p.alarms.iter()) {
        if let Some(slot) = mask.get_mut(alarm.index) {
            *slot = true;
        }
    }
    mask
}

pub(super) fn check_rows(signals: &MachineSignals, mask: &[bool]) -> Vec<CheckRow> {
    let voltage = |phase: Phase, i: usize| {
        signals
            .phase(phase)
            .and_then(|p| p.voltage.samples.get(i))
            .map_or(f64::NAN, |s| s.value)
    };

    signals
        .response_time_ms
        .iter()
        .enumerate()
        .map(|(i, response)| CheckRow {
            machine: signals.machine.clone(),
            timestamp: response.timestamp,
            response_time_ms: response.value,
            voltage_a: voltage(Phase::A, i),
            voltage_b: voltage(Phase::B, i),
            voltage_c: voltage(Phase::C, i),
            in_alarm: mask.get(i).copied().unwrap_or(false),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlarmKind, PhaseChannels, PhaseSignal, Quantity, Sample};
    use chrono::TimeZone;

    fn signals(a: &[f64], b: &[f64], c: &[f64]) -> MachineSignals {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let channels = |phase, values: &[f64]| PhaseChannels {
            phase,
            voltage: PhaseSignal::from_values(phase, Quantity::Voltage, start, 10.0, values.iter().copied()).unwrap(),
            current: PhaseSignal::from_values(phase, Quantity::Current, start, 10.0, values.iter().copied()).unwrap(),
            power: Vec::new(),
        };
        let voltage_a = channels(Phase::A, a);
        let response_time_ms = voltage_a
            .voltage
            .samples
            .iter()
            .map(|s| Sample { timestamp: s.timestamp, value: 40.0 })
            .collect();
        MachineSignals {
            machine: "M".to_string(),
            phases: vec![voltage_a, channels(Phase::B, b), channels(Phase::C, c)],
            response_time_ms,
        }
    }

    fn summary() -> MachineSummary {
        MachineSummary {
            name: "M".to_string(),
            reliability_pct: 99.0,
            reliability_delta_pct: 0.0,
            operating_hours: 100.0,
            operating_hours_delta_pct: 0.0,
            fault_count: 0,
            fault_count_delta_pct: 0.0,
        }
    }

    #[test]
    fn test_uptime_counts_timestamps_not_alarms() {
        // Index 1 alarms on two phases, index 3 on one: 2 of 5 timestamps
        let s = signals(
            &[130.0, 150.0, 130.0, 130.0, 130.0],
            &[130.0, 110.0, 130.0, 145.0, 130.0],
            &[130.0; 5],
        );
        let report =
            build_machine_report(&s, summary(), &ThresholdConfig::default(), &SeverityPolicy::default())
                .unwrap();

        assert_eq!(report.alarm_count(), 3);
        assert!((report.uptime_pct - 60.0).abs() < 1e-9);
        assert_eq!(report.worst_severity, SeverityIndicator::Moderate);
        assert!((report.mean_response_ms - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_incidents_group_consecutive_runs() {
        let s = signals(
            &[150.0, 151.0, 130.0, 150.0, 110.0],
            &[130.0; 5],
            &[130.0; 5],
        );
        let report =
            build_machine_report(&s, summary(), &ThresholdConfig::default(), &SeverityPolicy::default())
                .unwrap();

        let kinds: Vec<(AlarmKind, usize)> = report.incidents.iter().map(|i| (i.kind, i.samples)).collect();
        assert_eq!(
            kinds,
            vec![(AlarmKind::Above, 2), (AlarmKind::Above, 1), (AlarmKind::Below, 1)]
        );
    }

    #[test]
    fn test_overview_of_empty_fleet() {
        let report = FleetReport::new(ThresholdConfig::default(), Vec::new());
        assert_eq!(report.overview.machine_count, 0);
        assert_eq!(report.overview.uptime_pct, 100.0);
        assert_eq!(report.overview.incident_count, 0);
        assert_eq!(report.overview.worst_severity, SeverityIndicator::None);
    }

    #[test]
    fn test_check_rows_flag_alarmed_timestamps() {
        let s = signals(&[130.0, 150.0], &[130.0, 130.0], &[119.0, 130.0]);
        let phases = super::super::evaluate_phases(&s, &ThresholdConfig::default(), &SeverityPolicy::default()).unwrap();
        let rows = check_rows(&s, &alarm_mask(s.len(), &phases));

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.in_alarm));
        assert_eq!(rows[1].voltage_a, 150.0);
        assert_eq!(rows[0].voltage_c, 119.0);
    }
}
