//! Process-wide usage tracker with time-gated file backup.
//!
//! One [`UsageTracker`] is built at startup with [`UsageTracker::load_or_create`]
//! and shared behind an `Arc`. A single mutex serializes increments and the
//! backup write that may follow them.
//!
//! Telemetry never fails a request: load and backup errors are logged here
//! and discarded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::statistics::{UsageKind, UsageStatistics};

/// Usage counters for every tracked operation, backed by a JSON file.
#[derive(Debug)]
pub struct UsageTracker {
    path: PathBuf,
    state: Mutex<UsageStatistics>,
}

impl UsageTracker {
    /// Rebuild the tracker from the snapshot at `path`, or start empty.
    ///
    /// A missing, unreadable or malformed file yields an empty snapshot. The
    /// given `backup_interval` replaces whatever interval the file recorded.
    pub fn load_or_create(path: impl Into<PathBuf>, backup_interval: Duration) -> Self {
        let path = path.into();
        let mut stats = match read_snapshot(&path) {
            Ok(Some(stats)) => {
                debug!(path = %path.display(), "usage history loaded");
                stats
            }
            Ok(None) => {
                debug!(path = %path.display(), "no usage history, starting empty");
                UsageStatistics::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load usage history, starting empty");
                UsageStatistics::default()
            }
        };
        stats.backup_interval_secs = backup_interval.as_secs();
        Self::with_statistics(path, stats)
    }

    /// Tracker over an existing snapshot.
    pub fn with_statistics(path: impl Into<PathBuf>, stats: UsageStatistics) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(stats),
        }
    }

    /// Backup file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one call of `kind` now.
    pub fn increment(&self, kind: UsageKind) {
        self.increment_at(kind, Utc::now());
    }

    /// Record one call of `kind` at `now`, then back up if the interval has
    /// elapsed.
    pub fn increment_at(&self, kind: UsageKind, now: DateTime<Utc>) {
        let mut stats = self.state.lock();
        stats.increment_on(kind, now.date_naive());

        if stats.backup_due(now) {
            stats.last_saved = Some(now);
            if let Err(e) = write_snapshot(&self.path, &stats) {
                warn!(path = %self.path.display(), operation = %kind, error = %e, "usage backup failed");
            } else {
                debug!(path = %self.path.display(), "usage history backed up");
            }
        }
    }

    /// Copy of the current counters, including increments not yet backed up.
    pub fn snapshot(&self) -> UsageStatistics {
        self.state.lock().clone()
    }

    /// Write the snapshot now, regardless of the backup interval.
    pub fn flush(&self) -> Result<()> {
        let mut stats = self.state.lock();
        let previous = stats.last_saved.replace(Utc::now());
        let written = write_snapshot(&self.path, &stats);
        if written.is_err() {
            stats.last_saved = previous;
        }
        written
    }
}

/// Read a snapshot file. A missing file is `Ok(None)`.
pub fn read_snapshot(path: &Path) -> Result<Option<UsageStatistics>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}

fn write_snapshot(path: &Path, stats: &UsageStatistics) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
