//! Deployment settings, loaded from TOML.
//!
//! Every key is optional; a missing file section falls back to the defaults
//! below, so an empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ledger::AccountingMode;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings shared by the labeling and replay screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplaySettings {
    /// Ticker label used in archive file names.
    pub ticker: String,
    /// Bar interval label (`1d`, `15m`, ...).
    pub interval: String,
    /// Name of the timestamp field in action records and bar CSVs.
    pub index_field: String,
    /// Seconds between replay ticks.
    pub replay_interval: f64,
    /// Bars skipped ahead of the tick when placing the replay window.
    pub offset: usize,
    /// Bars visible per replay tick.
    pub window_size: usize,
    /// Wrap the replay tick around the series.
    pub cyclic: bool,
    pub accounting: AccountingMode,
    pub assets_dir: PathBuf,
    pub actions_suffix: String,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            ticker: "AAPL".into(),
            interval: "1d".into(),
            index_field: "Date".into(),
            replay_interval: 1.0,
            offset: 0,
            window_size: 100,
            cyclic: true,
            accounting: AccountingMode::RealizedOnly,
            assets_dir: PathBuf::from("assets"),
            actions_suffix: "actions.csv".into(),
        }
    }
}

impl ReplaySettings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.index_field.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "index_field",
                reason: "must not be empty".into(),
            });
        }
        if !(self.replay_interval.is_finite() && self.replay_interval > 0.0) {
            return Err(SettingsError::Invalid {
                key: "replay_interval",
                reason: format!("must be a positive number of seconds, got {}", self.replay_interval),
            });
        }
        Ok(())
    }

    pub fn replay_interval_ms(&self) -> u64 {
        (self.replay_interval * 1000.0).round() as u64
    }
}
