//! Settings types with compiled defaults.
//!
//! Relative paths are resolved against the process working directory, so the
//! defaults place the database and the usage history next to each other in
//! `../home/`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSettings {
    /// Entity store settings.
    pub database: DatabaseSettings,
    /// Usage telemetry settings.
    pub usage: UsageSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Entity store settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// `SQLite` database file.
    pub path: PathBuf,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// How long to wait for a pooled connection, in seconds.
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("..").join("home").join("Cluster.db"),
            pool_size: 8,
            busy_timeout_ms: 5_000,
            connection_timeout_secs: 5,
        }
    }
}

impl DatabaseSettings {
    /// Connection acquisition timeout as a [`Duration`].
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

/// Usage telemetry settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageSettings {
    /// Usage history backup file.
    pub path: PathBuf,
    /// Minimum number of seconds between two backups.
    pub backup_interval_secs: u64,
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("..").join("home").join("history.json"),
            backup_interval_secs: 300,
        }
    }
}

impl UsageSettings {
    /// Backup interval as a [`Duration`].
    #[must_use]
    pub const fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs)
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive. `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
