//! # cluster-usage
//!
//! Daily call counters for the cluster operations, kept in memory and backed
//! up to a JSON file at most once per backup interval.
//!
//! - [`History`]: one counter series, at most one entry per UTC day.
//! - [`UsageStatistics`]: a series per [`UsageKind`] plus backup bookkeeping;
//!   also the file format.
//! - [`UsageTracker`]: the shared, mutex-guarded instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod history;
pub mod statistics;
pub mod tracker;

pub use errors::{Result, UsageError};
pub use history::{CountPerDay, History};
pub use statistics::{DEFAULT_BACKUP_INTERVAL_SECS, UsageKind, UsageStatistics};
pub use tracker::UsageTracker;
