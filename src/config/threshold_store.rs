//! In-memory voltage threshold slot
//!
//! Holds the session's active [`ThresholdConfig`]. Readers get a snapshot
//! without locking; `save` validates before swapping, so a rejected update
//! leaves the previous band in place. Nothing is written to disk.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::alarms::{self, AlarmError};
use crate::types::ThresholdConfig;

pub struct ThresholdStore {
    current: ArcSwap<ThresholdConfig>,
}

impl ThresholdStore {
    /// Create a store holding `initial`, which must already be a valid band.
    pub fn new(initial: ThresholdConfig) -> Result<Self, AlarmError> {
        alarms::validate_range(initial.min_v, initial.max_v)?;
        Ok(Self {
            current: ArcSwap::from_pointee(initial),
        })
    }

    /// Snapshot of the active band
    pub fn current(&self) -> ThresholdConfig {
        **self.current.load()
    }

    /// Validate and commit a new band.
    ///
    /// On error the stored band is untouched and the error names the bound at
    /// fault.
    pub fn save(&self, min_v: f64, max_v: f64) -> Result<ThresholdConfig, AlarmError> {
        if let Err(e) = alarms::validate_range(min_v, max_v) {
            warn!(min_v, max_v, error = %e, "Rejected threshold update");
            return Err(e);
        }

        let updated = ThresholdConfig { min_v, max_v };
        let previous = self.current.swap(Arc::new(updated));
        info!(previous = %previous, current = %updated, "Threshold band updated");
        Ok(updated)
    }
}

impl Default for ThresholdStore {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(ThresholdConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band() {
        let store = ThresholdStore::default();
        assert_eq!(store.current(), ThresholdConfig::default());
    }

    #[test]
    fn test_save_commits_valid_band() {
        let store = ThresholdStore::default();
        let saved = store.save(115.0, 135.0).unwrap();
        assert_eq!(saved, ThresholdConfig { min_v: 115.0, max_v: 135.0 });
        assert_eq!(store.current(), saved);
    }

    #[test]
    fn test_rejected_save_keeps_previous() {
        let store = ThresholdStore::default();
        store.save(110.0, 130.0).unwrap();

        for (min, max) in [(130.0, 130.0), (140.0, 120.0), (f64::NAN, 130.0)] {
            assert!(matches!(store.save(min, max), Err(AlarmError::InvalidRange { .. })));
            assert_eq!(store.current(), ThresholdConfig { min_v: 110.0, max_v: 130.0 });
        }
    }

    #[test]
    fn test_new_rejects_invalid_initial() {
        assert!(ThresholdStore::new(ThresholdConfig { min_v: 5.0, max_v: 1.0 }).is_err());
    }
}
