//! # cluster-settings
//!
//! Configuration for the cluster service, loaded from three layers (in
//! priority order):
//! 1. **Compiled defaults**: [`ClusterSettings::default()`]
//! 2. **Settings file**: JSON, deep-merged over the defaults
//! 3. **Environment variables**: `CLUSTER_*` overrides (highest priority)
//!
//! The resolved settings are plain data handed to the store, the usage
//! tracker and the logging setup at startup.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ClusterSettings, DatabaseSettings, LoggingSettings, UsageSettings};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
