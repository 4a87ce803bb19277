//! Usage snapshot: one [`History`] per tracked operation.
//!
//! The snapshot is also the on-disk format. A series that has never been
//! touched is `None` and serializes as `null`; it becomes an empty
//! [`History`] on its first increment.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::history::History;

/// Default minimum time between two backups.
pub const DEFAULT_BACKUP_INTERVAL_SECS: u64 = 300;

/// Tracked cluster operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// List every cluster identifier.
    GetAllClusterId,
    /// List every cluster header.
    GetAllClusterMetaInfo,
    /// Fetch one cluster.
    GetClusterById,
    /// Fetch every cluster.
    GetAllCluster,
    /// Create a cluster.
    PostCluster,
    /// Replace a cluster.
    PutClusterById,
    /// Delete a cluster.
    DeleteClusterById,
}

impl UsageKind {
    /// Every kind, in snapshot field order.
    pub const ALL: [Self; 7] = [
        Self::GetAllClusterId,
        Self::GetAllClusterMetaInfo,
        Self::GetClusterById,
        Self::GetAllCluster,
        Self::PostCluster,
        Self::PutClusterById,
        Self::DeleteClusterById,
    ];

    /// Short name for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetAllClusterId => "get_all_cluster_id",
            Self::GetAllClusterMetaInfo => "get_all_cluster_meta_info",
            Self::GetClusterById => "get_cluster_by_id",
            Self::GetAllCluster => "get_all_cluster",
            Self::PostCluster => "post_cluster",
            Self::PutClusterById => "put_cluster_by_id",
            Self::DeleteClusterById => "delete_cluster_by_id",
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-operation daily counters plus backup bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageStatistics {
    /// When the snapshot was last written, `None` if never.
    #[serde(alias = "LastSaved", with = "timestamp")]
    pub last_saved: Option<DateTime<Utc>>,
    /// Minimum number of seconds between two backups.
    pub backup_interval_secs: u64,
    /// Identifier listings.
    #[serde(alias = "GetAllClusterIdPerDay")]
    pub get_all_cluster_id_per_day: Option<History>,
    /// Header listings.
    #[serde(alias = "GetAllClusterMetaInfoPerDay")]
    pub get_all_cluster_meta_info_per_day: Option<History>,
    /// Single-cluster fetches.
    #[serde(alias = "GetClusterByIdPerDay")]
    pub get_cluster_by_id_per_day: Option<History>,
    /// Full listings.
    #[serde(alias = "GetAllClusterPerDay")]
    pub get_all_cluster_per_day: Option<History>,
    /// Creations.
    #[serde(alias = "PostClusterPerDay")]
    pub post_cluster_per_day: Option<History>,
    /// Replacements.
    #[serde(alias = "PutClusterByIdPerDay")]
    pub put_cluster_by_id_per_day: Option<History>,
    /// Deletions.
    #[serde(alias = "DeleteClusterByIdPerDay")]
    pub delete_cluster_by_id_per_day: Option<History>,
}

/// Serde helper for the last-saved timestamp. Writes RFC 3339; also reads a
/// timestamp without offset, taken as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        t.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        if let Ok(t) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(t.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Some(naive.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}

impl Default for UsageStatistics {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_BACKUP_INTERVAL_SECS))
    }
}

impl UsageStatistics {
    /// Empty snapshot with the given backup interval.
    pub fn new(backup_interval: Duration) -> Self {
        Self {
            last_saved: None,
            backup_interval_secs: backup_interval.as_secs(),
            get_all_cluster_id_per_day: None,
            get_all_cluster_meta_info_per_day: None,
            get_cluster_by_id_per_day: None,
            get_all_cluster_per_day: None,
            post_cluster_per_day: None,
            put_cluster_by_id_per_day: None,
            delete_cluster_by_id_per_day: None,
        }
    }

    /// Series for `kind`, `None` if never incremented.
    pub fn series(&self, kind: UsageKind) -> Option<&History> {
        match kind {
            UsageKind::GetAllClusterId => self.get_all_cluster_id_per_day.as_ref(),
            UsageKind::GetAllClusterMetaInfo => self.get_all_cluster_meta_info_per_day.as_ref(),
            UsageKind::GetClusterById => self.get_cluster_by_id_per_day.as_ref(),
            UsageKind::GetAllCluster => self.get_all_cluster_per_day.as_ref(),
            UsageKind::PostCluster => self.post_cluster_per_day.as_ref(),
            UsageKind::PutClusterById => self.put_cluster_by_id_per_day.as_ref(),
            UsageKind::DeleteClusterById => self.delete_cluster_by_id_per_day.as_ref(),
        }
    }

    fn series_slot(&mut self, kind: UsageKind) -> &mut Option<History> {
        match kind {
            UsageKind::GetAllClusterId => &mut self.get_all_cluster_id_per_day,
            UsageKind::GetAllClusterMetaInfo => &mut self.get_all_cluster_meta_info_per_day,
            UsageKind::GetClusterById => &mut self.get_cluster_by_id_per_day,
            UsageKind::GetAllCluster => &mut self.get_all_cluster_per_day,
            UsageKind::PostCluster => &mut self.post_cluster_per_day,
            UsageKind::PutClusterById => &mut self.put_cluster_by_id_per_day,
            UsageKind::DeleteClusterById => &mut self.delete_cluster_by_id_per_day,
        }
    }

    /// Record one `kind` call on `day`, creating the series if needed.
    pub fn increment_on(&mut self, kind: UsageKind, day: NaiveDate) {
        self.series_slot(kind)
            .get_or_insert_with(History::default)
            .increment_on(day);
    }

    /// Total calls recorded for `kind`.
    pub fn total(&self, kind: UsageKind) -> u64 {
        self.series(kind).map_or(0, History::total)
    }

    /// Minimum time between two backups.
    pub const fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs)
    }

    /// Whether a backup is due at `now`.
    pub fn backup_due(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_saved else {
            return true;
        };
        let interval = chrono::Duration::from_std(self.backup_interval())
            .unwrap_or(chrono::Duration::MAX);
        last.checked_add_signed(interval)
            .is_none_or(|next| now >= next)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn new_snapshot_is_uninitialized() {
        let stats = UsageStatistics::default();
        assert_eq!(stats.backup_interval_secs, DEFAULT_BACKUP_INTERVAL_SECS);
        for kind in UsageKind::ALL {
            assert!(stats.series(kind).is_none(), "{kind} should be None");
            assert_eq!(stats.total(kind), 0);
        }
    }

    #[test]
    fn increment_touches_only_its_series() {
        let mut stats = UsageStatistics::default();
        let day = at(0, 0, 0).date_naive();
        stats.increment_on(UsageKind::PostCluster, day);
        stats.increment_on(UsageKind::PostCluster, day);

        assert_eq!(stats.total(UsageKind::PostCluster), 2);
        for kind in UsageKind::ALL {
            if kind != UsageKind::PostCluster {
                assert!(stats.series(kind).is_none());
            }
        }
    }

    #[test]
    fn backup_due_when_never_saved() {
        assert!(UsageStatistics::default().backup_due(at(12, 0, 0)));
    }

    #[test]
    fn backup_gated_by_interval() {
        let mut stats = UsageStatistics::new(Duration::from_secs(300));
        stats.last_saved = Some(at(12, 0, 0));
        assert!(!stats.backup_due(at(12, 0, 1)));
        assert!(!stats.backup_due(at(12, 4, 59)));
        assert!(stats.backup_due(at(12, 5, 0)));
        assert!(stats.backup_due(at(13, 0, 0)));
    }

    #[test]
    fn zero_interval_always_due() {
        let mut stats = UsageStatistics::new(Duration::ZERO);
        stats.last_saved = Some(at(12, 0, 0));
        assert!(stats.backup_due(at(12, 0, 0)));
    }

    #[test]
    fn json_field_names() {
        let mut stats = UsageStatistics::default();
        stats.increment_on(UsageKind::GetAllClusterMetaInfo, at(0, 0, 0).date_naive());
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["backupIntervalSecs"], 300);
        assert!(json["lastSaved"].is_null());
        assert_eq!(json["getAllClusterMetaInfoPerDay"]["data"][0]["count"], 1);
        assert!(json["deleteClusterByIdPerDay"].is_null());
    }

    #[test]
    fn reads_pascal_case_history() {
        let stats: UsageStatistics = serde_json::from_str(
            r#"{
                "LastSaved": "2024-03-01T10:15:30.1234567",
                "BackUpInterval": "00:05:00",
                "GetAllClusterIdPerDay": {"Data": []},
                "PostClusterPerDay": {"Data": [{"Date": "2024-03-01T00:00:00Z", "Count": 42}]}
            }"#,
        )
        .unwrap();
        assert_eq!(stats.total(UsageKind::PostCluster), 42);
        assert!(stats.series(UsageKind::GetAllClusterId).unwrap().is_empty());
        assert!(stats.get_cluster_by_id_per_day.is_none());
        assert_eq!(stats.last_saved.map(|t| t.date_naive()), Some(at(0, 0, 0).date_naive()));
        assert_eq!(stats.backup_interval_secs, DEFAULT_BACKUP_INTERVAL_SECS);
    }

    #[test]
    fn last_saved_roundtrips_as_rfc3339() {
        let mut stats = UsageStatistics::default();
        stats.last_saved = Some(at(12, 30, 0));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["lastSaved"], "2024-03-01T12:30:00Z");
        let back: UsageStatistics = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn tolerant_decoding() {
        let stats: UsageStatistics = serde_json::from_str(
            r#"{"postClusterPerDay":{"data":[{"date":"2024-03-01","count":4}]},"unknown":true}"#,
        )
        .unwrap();
        assert_eq!(stats.total(UsageKind::PostCluster), 4);
        assert_eq!(stats.backup_interval_secs, DEFAULT_BACKUP_INTERVAL_SECS);
        assert!(stats.get_cluster_by_id_per_day.is_none());
    }
}
