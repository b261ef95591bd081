use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Upper bound on the status rewrite period
pub const MAX_STATUS_INTERVAL_SECS: f64 = 3600.0;

/// Runtime plumbing. Detector and filter thresholds are constants in their
/// own modules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // ── Queues ──
    /// Raw reports buffered between source and worker
    pub report_queue_capacity: usize,
    /// Snapshots/events buffered between worker and consumer
    pub output_queue_capacity: usize,

    // ── Status output ──
    pub output_dir: PathBuf,
    pub status_interval_secs: f64,
    /// Events included in the status file
    pub status_recent_events: usize,

    // ── Synthetic source ──
    /// Seconds between simulated taps; 0 disables them
    pub tap_period_secs: f64,
    /// Peak tap acceleration in g
    pub tap_amplitude_g: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_queue_capacity: 4096,
            output_queue_capacity: 64,
            output_dir: PathBuf::from("motion_sessions"),
            status_interval_secs: 1.0,
            status_recent_events: 20,
            tap_period_secs: 5.0,
            tap_amplitude_g: 0.3,
        }
    }
}

impl MonitorConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: MonitorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.report_queue_capacity == 0 {
            return Err(MonitorError::InvalidConfig("report_queue_capacity must be > 0".into()));
        }
        if self.output_queue_capacity == 0 {
            return Err(MonitorError::InvalidConfig("output_queue_capacity must be > 0".into()));
        }
        if !(self.status_interval_secs > 0.0 && self.status_interval_secs <= MAX_STATUS_INTERVAL_SECS) {
            return Err(MonitorError::InvalidConfig(format!(
                "status_interval_secs must be in (0, {}], got {}",
                MAX_STATUS_INTERVAL_SECS, self.status_interval_secs
            )));
        }
        if !(self.tap_period_secs >= 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "tap_period_secs must be >= 0, got {}",
                self.tap_period_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: MonitorConfig = serde_json::from_str(r#"{"output_queue_capacity": 8}"#).unwrap();
        assert_eq!(cfg.output_queue_capacity, 8);
        assert_eq!(cfg.report_queue_capacity, MonitorConfig::default().report_queue_capacity);
    }

    #[test]
    fn test_rejects_zero_queue() {
        let cfg = MonitorConfig { report_queue_capacity: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_finite_interval() {
        for secs in [0.0, -1.0, 1e300, f64::INFINITY, f64::NAN] {
            let cfg = MonitorConfig { status_interval_secs: secs, ..Default::default() };
            assert!(matches!(cfg.validate(), Err(MonitorError::InvalidConfig(_))), "{secs}");
        }
        let cfg = MonitorConfig { status_interval_secs: MAX_STATUS_INTERVAL_SECS, ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_oversized_interval() {
        let path = std::env::temp_dir().join(format!("motion_sense_cfg_big_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"status_interval_secs": 1e300}"#).unwrap();
        let result = MonitorConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("motion_sense_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"status_interval_secs": 2.5, "tap_period_secs": 0}"#).unwrap();
        let cfg = MonitorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.status_interval_secs, 2.5);
        assert_eq!(cfg.tap_period_secs, 0.0);
    }
}
