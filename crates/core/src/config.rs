//! Configuration loaded from `.garage/config.toml`
//!
//! Every field has a default, so a missing file or a partial file is valid.

use crate::error::StoreError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Settings for what the supervisor observes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Honour `.garageignore` at the watched root (default: true)
    #[serde(default = "default_true")]
    pub use_ignore_file: bool,

    /// Additional gitignore-style patterns
    #[serde(default)]
    pub additional_patterns: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            use_ignore_file: true,
            additional_patterns: vec![],
        }
    }
}

/// Settings for the background process lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Maximum wait for a stopped supervisor to exit during commit
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    /// Liveness poll period while waiting for a supervisor to exit
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Tracing filter used when `GARAGE_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: default_stop_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            log_filter: default_log_filter(),
        }
    }
}

impl DaemonConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let config: Config = toml::from_str(&content).map_err(|e| StoreError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate().map_err(|message| StoreError::Config {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(1..=600).contains(&self.daemon.stop_timeout_secs) {
            return Err(format!(
                "daemon.stop_timeout_secs must be between 1 and 600, got {}",
                self.daemon.stop_timeout_secs
            ));
        }
        if !(10..=5000).contains(&self.daemon.poll_interval_ms) {
            return Err(format!(
                "daemon.poll_interval_ms must be between 10 and 5000, got {}",
                self.daemon.poll_interval_ms
            ));
        }
        if self.daemon.log_filter.trim().is_empty() {
            return Err("daemon.log_filter must not be empty".to_string());
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_stop_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_log_filter() -> String {
    "info".to_string()
}
