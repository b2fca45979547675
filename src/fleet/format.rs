//! Plain-text renderings for terminal output

use super::{CheckRow, FleetReport, PhaseAlarms};
use crate::types::Incident;

/// Fleet KPIs followed by one line per machine.
///
/// ```text
/// WebDeck fleet overview (band [120 V, 140 V])
/// Uptime: 99.6% | Mean response: 45.1 ms | Incidents: 3 | Alarms: 4
///
/// Machine 1  🟢  reliability 99.8% (+0.57%)  hours 1820 (-3.79%)  faults 1 (-57.14%)  A:NONE B:NONE C:NONE
/// ```
pub fn format_overview(report: &FleetReport) -> String {
    let o = &report.overview;
    let mut output = format!("WebDeck fleet overview (band {})\n", report.thresholds);
    output.push_str(&format!(
        "Uptime: {:.1}% | Mean response: {:.1} ms | Incidents: {} | Alarms: {}\n",
        o.uptime_pct, o.mean_response_ms, o.incident_count, o.alarm_count
    ));

    if report.machines.is_empty() {
        output.push_str("\n(no machines configured)\n");
        return output;
    }

    output.push('\n');
    let width = report.machines.iter().map(|m| m.name().len()).max().unwrap_or(0);
    for m in &report.machines {
        let s = &m.summary;
        let phases: Vec<String> = m
            .phases
            .iter()
            .map(|p| format!("{}:{}", p.phase, p.severity))
            .collect();
        output.push_str(&format!(
            "{:<width$}  {}  reliability {:.1}% ({:+.2}%)  hours {:.0} ({:+.2}%)  faults {} ({:+.2}%)  {}\n",
            s.name,
            m.worst_severity.glyph(),
            s.reliability_pct,
            s.reliability_delta_pct,
            s.operating_hours,
            s.operating_hours_delta_pct,
            s.fault_count,
            s.fault_count_delta_pct,
            phases.join(" "),
        ));
    }

    output
}

/// Per-phase alarm counts and the first few records of each phase.
pub fn format_alarms(machine: &str, phases: &[PhaseAlarms], limit: usize) -> String {
    let mut output = format!("Voltage alarms for {machine}\n");
    for p in phases {
        output.push_str(&format!(
            "Phase {} {} {} ({} alarms)\n",
            p.phase,
            p.severity.glyph(),
            p.severity,
            p.alarms.len()
        ));
        for a in p.alarms.iter().take(limit) {
            output.push_str(&format!(
                "  #{:<6} {}  {:>8.2} V  {}\n",
                a.index,
                a.timestamp.format("%H:%M:%S%.3f"),
                a.value,
                a.kind
            ));
        }
        if p.alarms.len() > limit {
            output.push_str(&format!("  ... {} more\n", p.alarms.len() - limit));
        }
    }
    output
}

/// Incident list; a single reassuring line when there is none.
pub fn format_incidents(incidents: &[Incident]) -> String {
    if incidents.is_empty() {
        return "No incidents recorded in the reporting window ✅\n".to_string();
    }

    let mut output = format!("{} incident(s)\n", incidents.len());
    for i in incidents {
        output.push_str(&format!(
            "{} phase {}  {} {} -> {}  {} sample(s), peak {:.2} V outside band\n",
            i.machine,
            i.phase,
            i.kind,
            i.start.format("%Y-%m-%d %H:%M:%S%.3f"),
            i.end.format("%H:%M:%S%.3f"),
            i.samples,
            i.peak_excursion
        ));
    }
    output
}

/// Checks table, at most `limit` rows per machine.
pub fn format_checks(rows: &[CheckRow], limit: usize) -> String {
    let mut output = format!(
        "{:<12} {:<23} {:>9} {:>8} {:>8} {:>8}  {}\n",
        "machine", "timestamp", "resp_ms", "V_a", "V_b", "V_c", "status"
    );

    let mut current: Option<&str> = None;
    let mut shown = 0;
    for row in rows {
        if current != Some(row.machine.as_str()) {
            current = Some(row.machine.as_str());
            shown = 0;
        }
        if shown == limit {
            output.push_str(&format!("{:<12} ...\n", row.machine));
        }
        shown += 1;
        if shown > limit {
            continue;
        }

        output.push_str(&format!(
            "{:<12} {:<23} {:>9.1} {:>8.2} {:>8.2} {:>8.2}  {}\n",
            row.machine,
            row.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            row.response_time_ms,
            row.voltage_a,
            row.voltage_b,
            row.voltage_c,
            if row.in_alarm { "ALARM" } else { "ok" }
        ));
    }
    output
}
