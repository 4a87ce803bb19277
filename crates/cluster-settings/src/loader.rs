//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ClusterSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `CLUSTER_*` environment variable overrides
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::ClusterSettings;

/// Environment variable naming an alternative settings file.
pub const SETTINGS_PATH_ENV: &str = "CLUSTER_SETTINGS";

/// Resolve the settings file path: `$CLUSTER_SETTINGS`, else
/// `~/.cluster/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".cluster").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ClusterSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, starts from defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ClusterSettings> {
    let mut settings = read_settings_file(path)?;
    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Read and deep-merge the settings file over the defaults, without env
/// overrides.
pub fn read_settings_file(path: &Path) -> Result<ClusterSettings> {
    let defaults = serde_json::to_value(ClusterSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `CLUSTER_*` overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (falling back to file/default).
pub fn apply_overrides<F>(settings: &mut ClusterSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|v| !v.is_empty());

    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = read("CLUSTER_DB_PATH") {
        settings.database.path = PathBuf::from(v);
    }
    if let Some(v) = read("CLUSTER_DB_POOL_SIZE") {
        match parse_u32_range(&v, 1, 256) {
            Some(n) => settings.database.pool_size = n,
            None => warn!(key = "CLUSTER_DB_POOL_SIZE", value = %v, "invalid env var, ignoring"),
        }
    }

    // ── Usage telemetry ─────────────────────────────────────────────
    if let Some(v) = read("CLUSTER_USAGE_PATH") {
        settings.usage.path = PathBuf::from(v);
    }
    if let Some(v) = read("CLUSTER_USAGE_BACKUP_INTERVAL_SECS") {
        match parse_u64_range(&v, 0, 86_400) {
            Some(n) => settings.usage.backup_interval_secs = n,
            None => warn!(
                key = "CLUSTER_USAGE_BACKUP_INTERVAL_SECS",
                value = %v,
                "invalid env var, ignoring"
            ),
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("CLUSTER_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Reject settings the store cannot run with.
pub fn validate(settings: &ClusterSettings) -> Result<()> {
    if settings.database.pool_size == 0 {
        return Err(SettingsError::InvalidValue(
            "database.poolSize must be at least 1".into(),
        ));
    }
    if settings.database.path.as_os_str().is_empty() {
        return Err(SettingsError::InvalidValue(
            "database.path must not be empty".into(),
        ));
    }
    if settings.usage.path.as_os_str().is_empty() {
        return Err(SettingsError::InvalidValue(
            "usage.path must not be empty".into(),
        ));
    }
    Ok(())
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
