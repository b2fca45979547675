//! Config validation: unknown-key detection with Levenshtein suggestions
//! and fleet range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use crate::types::MachineProfile;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for MonitorConfig.
///
/// Array-of-table entries (`[[fleet.machines]]`) share one path without an
/// index. Any new field added to MonitorConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [thresholds]
        "thresholds",
        "thresholds.voltage_min_v",
        "thresholds.voltage_max_v",
        // [severity]
        "severity",
        "severity.moderate_max_alarms",
        // [metrics]
        "metrics",
        "metrics.mean_epsilon",
        // [synthesis]
        "synthesis",
        "synthesis.seed",
        "synthesis.start_unix_s",
        "synthesis.sample_rate_hz",
        "synthesis.n_samples",
        "synthesis.fundamental_hz",
        "synthesis.power_factor",
        "synthesis.response_time_jitter_ms",
        // [synthesis.voltage] / [synthesis.current]
        "synthesis.voltage",
        "synthesis.voltage.amplitude",
        "synthesis.voltage.dc_offset",
        "synthesis.voltage.harmonic3_ratio",
        "synthesis.voltage.harmonic5_ratio",
        "synthesis.voltage.noise_std",
        "synthesis.current",
        "synthesis.current.amplitude",
        "synthesis.current.dc_offset",
        "synthesis.current.harmonic3_ratio",
        "synthesis.current.harmonic5_ratio",
        "synthesis.current.noise_std",
        // [[fleet.machines]]
        "fleet",
        "fleet.machines",
        "fleet.machines.name",
        "fleet.machines.reliability_pct",
        "fleet.machines.operating_hours",
        "fleet.machines.fault_count",
        "fleet.machines.response_time_base_ms",
        "fleet.machines.voltage_noise",
        "fleet.machines.voltage_noise.a",
        "fleet.machines.voltage_noise.b",
        "fleet.machines.voltage_noise.c",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside arrays are walked under the array's
/// own path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            match v {
                toml::Value::Table(_) => keys.extend(walk_toml_keys(v, &path)),
                toml::Value::Array(items) => {
                    for item in items.iter().filter(|i| i.is_table()) {
                        for nested in walk_toml_keys(item, &path) {
                            if !keys.contains(&nested) {
                                keys.push(nested);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the alphabetically first key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();

    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Fleet Range Validation
// ============================================================================

/// Validate machine profiles.
///
/// Returns (errors, warnings): errors are impossible values that must prevent
/// startup; warnings are suspicious but not fatal.
pub fn validate_fleet(machines: &[MachineProfile]) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    if machines.is_empty() {
        warnings.push(ValidationWarning {
            field: "fleet.machines".to_string(),
            message: "fleet.machines is empty; reports will contain no machines".to_string(),
            suggestion: None,
        });
    }

    for m in machines {
        if m.name.trim().is_empty() {
            errors.push("fleet.machines.name cannot be empty".to_string());
        } else if !seen.insert(m.name.trim().to_lowercase()) {
            // Lookups by name ignore case and surrounding whitespace
            errors.push(format!("fleet.machines.name '{}' is used more than once", m.name));
        }

        if !(0.0..=100.0).contains(&m.reliability_pct) {
            errors.push(format!(
                "{}: reliability_pct = {:.1} is outside 0-100",
                m.name, m.reliability_pct
            ));
        }
        if !m.operating_hours.is_finite() || m.operating_hours < 0.0 {
            errors.push(format!(
                "{}: operating_hours = {:.1} cannot be negative",
                m.name, m.operating_hours
            ));
        }
        if !m.response_time_base_ms.is_finite() || m.response_time_base_ms < 0.0 {
            errors.push(format!(
                "{}: response_time_base_ms = {:.1} cannot be negative",
                m.name, m.response_time_base_ms
            ));
        }
        for (phase, noise) in ["a", "b", "c"].iter().zip(m.voltage_noise.as_array()) {
            if let Some(n) = noise {
                if !n.is_finite() || n < 0.0 {
                    errors.push(format!(
                        "{}: voltage_noise.{phase} = {n} cannot be negative",
                        m.name
                    ));
                }
            }
        }

        // (0, 1] is almost always a fraction typed where a percentage belongs
        if m.reliability_pct > 0.0 && m.reliability_pct <= 1.0 {
            warnings.push(ValidationWarning {
                field: "fleet.machines.reliability_pct".to_string(),
                message: format!(
                    "{}: reliability_pct = {} looks like a fraction; the value is a percentage",
                    m.name, m.reliability_pct
                ),
                suggestion: None,
            });
        }
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("voltage_mni_v", "voltage_min_v"), 2);
        assert_eq!(levenshtein("harmonic3_rato", "harmonic3_ratio"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [synthesis]
            [synthesis.voltage]
            amplitude = 10.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"synthesis".to_string()));
        assert!(keys.contains(&"synthesis.voltage".to_string()));
        assert!(keys.contains(&"synthesis.voltage.amplitude".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[fleet.machines]]
            name = "A"
            [[fleet.machines]]
            name = "B"
            [fleet.machines.voltage_noise]
            b = 2.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert_eq!(keys.iter().filter(|k| *k == "fleet.machines.name").count(), 1);
        assert!(keys.contains(&"fleet.machines.voltage_noise.b".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[thresholds]
voltge_min_v = 118.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("voltge_min_v"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("thresholds.voltage_min_v")
        );
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_fleet_duplicate_and_range_errors() {
        let mut machines = MachineProfile::default_fleet();
        machines[1].name = machines[0].name.clone();
        machines[2].reliability_pct = 120.0;
        machines[2].voltage_noise.c = Some(-1.0);
        // Same machine as far as name lookups are concerned
        machines.push(MachineProfile::new(" MACHINE 3 ", 99.0, 10.0, 0));

        let (errors, _) = validate_fleet(&machines);
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert_eq!(errors.iter().filter(|e| e.contains("more than once")).count(), 2);
        assert!(errors.iter().any(|e| e.contains("' MACHINE 3 '")));
        assert!(errors.iter().any(|e| e.contains("reliability_pct")));
        assert!(errors.iter().any(|e| e.contains("voltage_noise.c")));
    }

    #[test]
    fn test_fraction_reliability_warns() {
        let machines = vec![MachineProfile::new("M", 0.98, 10.0, 0)];
        let (errors, warnings) = validate_fleet(&machines);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_default_fleet_is_clean() {
        let (errors, warnings) = validate_fleet(&MachineProfile::default_fleet());
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty());
    }
}
