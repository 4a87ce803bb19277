//! High-level transactional [`ClusterStore`] API.
//!
//! Wraps a [`ConnectionProvider`] and the [`ClusterRepo`] SQL. Every mutating
//! method runs inside its own `IMMEDIATE` transaction; a failed row-count
//! postcondition drops the transaction, rolling it back.
//!
//! The row's primary key and the identifier inside its payload must agree.
//! Reads check this and report [`StoreError::Corrupted`] instead of repairing.

use std::path::Path;

use cluster_core::{Cluster, ClusterId, MetaInfo};
use rusqlite::{Transaction, TransactionBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::connection::{self, ConnectionConfig, ConnectionPool, ConnectionProvider};
use crate::errors::{Result, StoreError};
use crate::migrations;
use crate::repository::{ClusterFilter, ClusterRecord, ClusterRepo};

/// Cluster persistence over a pool of `SQLite` connections.
#[derive(Clone, Debug)]
pub struct ClusterStore<P = ConnectionPool> {
    provider: P,
}

impl ClusterStore<ConnectionPool> {
    /// Open (or create) a file-backed store and bring its schema up to date.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        let store = Self::new(connection::new_file(path, config)?);
        let applied = store.migrate()?;
        info!(path = %path.display(), applied, "cluster store opened");
        Ok(store)
    }

    /// A migrated in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let store = Self::new(connection::new_in_memory(&ConnectionConfig::default())?);
        let _ = store.migrate()?;
        Ok(store)
    }
}

impl<P: ConnectionProvider> ClusterStore<P> {
    /// Wrap a connection provider. The schema is not touched; see
    /// [`ClusterStore::migrate`].
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Apply pending schema migrations. Returns how many were applied.
    pub fn migrate(&self) -> Result<u32> {
        let conn = self.provider.get_connection()?;
        migrations::run_migrations(&conn)
    }

    /// The underlying connection provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Number of stored clusters; 0 if the backend cannot be queried.
    pub fn count(&self) -> usize {
        self.try_count().unwrap_or_else(|e| {
            error!(error = %e, operation = "count", "failed to count clusters");
            0
        })
    }

    /// Number of stored clusters.
    pub fn try_count(&self) -> Result<usize> {
        let conn = self.provider.get_connection()?;
        ClusterRepo::count(&conn)
    }

    /// Whether a cluster with this identifier is stored.
    pub fn exists(&self, id: ClusterId) -> Result<bool> {
        let conn = self.provider.get_connection()?;
        ClusterRepo::exists(&conn, id)
    }

    /// Identifiers of every stored cluster.
    #[instrument(skip_all, fields(operation = "list_ids"))]
    pub fn list_ids(&self) -> Result<Vec<ClusterId>> {
        let conn = self.provider.get_connection()?;
        Ok(parse_ids(ClusterRepo::list_ids(&conn)?))
    }

    /// Headers of every stored cluster, read from the header column.
    ///
    /// Rows whose header cannot be decoded are skipped.
    #[instrument(skip_all, fields(operation = "list_headers"))]
    pub fn list_headers(&self) -> Result<Vec<MetaInfo>> {
        let conn = self.provider.get_connection()?;
        let headers = ClusterRepo::list_headers(&conn)?
            .into_iter()
            .filter_map(|(id, raw)| match serde_json::from_str::<MetaInfo>(&raw) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!(cluster_id = %id, error = %e, "skipping undecodable header");
                    None
                }
            })
            .collect();
        Ok(headers)
    }

    /// The cluster stored under `id`, or `None` if there is no such row.
    #[instrument(skip_all, fields(operation = "get_by_id", cluster_id = %id))]
    pub fn get_by_id(&self, id: ClusterId) -> Result<Option<Cluster>> {
        require_id(id)?;
        let conn = self.provider.get_connection()?;
        match ClusterRepo::get_payload(&conn, id)? {
            Some(payload) => decode_payload(id, &payload).map(Some),
            None => Ok(None),
        }
    }

    /// Every stored cluster. A row that cannot be decoded yields `None` in
    /// its place.
    #[instrument(skip_all, fields(operation = "list_all"))]
    pub fn list_all(&self) -> Result<Vec<Option<Cluster>>> {
        let conn = self.provider.get_connection()?;
        let clusters = ClusterRepo::list_payloads(&conn)?
            .into_iter()
            .map(|(raw_id, payload)| {
                let decoded = raw_id
                    .parse::<ClusterId>()
                    .map_err(|e| StoreError::Corrupted {
                        id: ClusterId::nil(),
                        detail: format!("malformed row id {raw_id}: {e}"),
                    })
                    .and_then(|id| decode_payload(id, &payload));
                match decoded {
                    Ok(cluster) => Some(cluster),
                    Err(e) => {
                        warn!(cluster_id = %raw_id, error = %e, "undecodable cluster row");
                        None
                    }
                }
            })
            .collect();
        Ok(clusters)
    }

    /// Identifiers of clusters whose projection columns match `filter`.
    #[instrument(skip_all, fields(operation = "find_ids"))]
    pub fn find_ids(&self, filter: &ClusterFilter) -> Result<Vec<ClusterId>> {
        let conn = self.provider.get_connection()?;
        Ok(parse_ids(ClusterRepo::find_ids(&conn, filter)?))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a new cluster.
    ///
    /// Fails with [`StoreError::Conflict`] if the identifier is already stored;
    /// an existing row is never overwritten.
    #[instrument(skip_all, fields(operation = "add", cluster_id = tracing::field::Empty))]
    pub fn add(&self, cluster: &Cluster) -> Result<()> {
        let record = ClusterRecord::encode(cluster)?;
        let _ = tracing::Span::current().record("cluster_id", record.id.as_str());

        let conn = self.provider.get_connection()?;
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
        let inserted = match ClusterRepo::insert(&tx, &record) {
            Ok(n) => n,
            Err(e) if e.is_constraint_violation() => {
                debug!("cluster already exists");
                return Err(StoreError::Conflict(cluster.id().unwrap_or_default()));
            }
            Err(e) => return Err(e),
        };
        expect_one("insert", inserted)?;
        tx.commit()?;

        debug!("cluster added");
        Ok(())
    }

    /// Replace the stored cluster `id` with `cluster`.
    ///
    /// `cluster` must carry `id` in its header. Updating a row that does not
    /// exist fails with [`StoreError::RowCountMismatch`].
    #[instrument(skip_all, fields(operation = "update_by_id", cluster_id = %id))]
    pub fn update_by_id(&self, id: ClusterId, cluster: &Cluster) -> Result<()> {
        require_id(id)?;
        match cluster.id() {
            Some(inner) if inner == id => {}
            Some(inner) => {
                return Err(StoreError::InvalidArgument(format!(
                    "metaInfo.id {inner} does not match {id}"
                )));
            }
            None => {
                return Err(StoreError::InvalidArgument(
                    "cluster has no metaInfo".into(),
                ));
            }
        }
        let record = ClusterRecord::encode(cluster)?;

        let conn = self.provider.get_connection()?;
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
        let updated = ClusterRepo::update(&tx, &record)?;
        expect_one("update", updated)?;
        tx.commit()?;

        debug!("cluster updated");
        Ok(())
    }

    /// Delete the cluster `id`. Returns whether a row was removed.
    #[instrument(skip_all, fields(operation = "delete_by_id", cluster_id = %id))]
    pub fn delete_by_id(&self, id: ClusterId) -> Result<bool> {
        require_id(id)?;
        let conn = self.provider.get_connection()?;
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
        let deleted = ClusterRepo::delete(&tx, id)?;
        tx.commit()?;

        if deleted == 0 {
            debug!("no cluster to delete");
        }
        Ok(deleted > 0)
    }

    /// Delete every cluster. Returns the number removed.
    #[instrument(skip_all, fields(operation = "clear"))]
    pub fn clear(&self) -> Result<usize> {
        let conn = self.provider.get_connection()?;
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
        let deleted = ClusterRepo::delete_all(&tx)?;
        tx.commit()?;

        info!(deleted, "cluster store cleared");
        Ok(deleted)
    }
}

/// Parse raw row keys, skipping (and logging) any that are not identifiers.
fn parse_ids(raw_ids: Vec<String>) -> Vec<ClusterId> {
    raw_ids
        .into_iter()
        .filter_map(|raw| {
            let parsed = raw.parse::<ClusterId>();
            if let Err(ref e) = parsed {
                warn!(raw_id = %raw, error = %e, "skipping row with malformed id");
            }
            parsed.ok()
        })
        .collect()
}

fn require_id(id: ClusterId) -> Result<()> {
    if id.is_nil() {
        return Err(StoreError::InvalidArgument("cluster id is empty".into()));
    }
    Ok(())
}

fn expect_one(operation: &'static str, actual: usize) -> Result<()> {
    if actual == 1 {
        return Ok(());
    }
    Err(StoreError::RowCountMismatch {
        operation,
        expected: 1,
        actual,
    })
}

fn decode_payload(id: ClusterId, payload: &str) -> Result<Cluster> {
    let cluster: Cluster = serde_json::from_str(payload).map_err(|e| StoreError::Corrupted {
        id,
        detail: format!("undecodable payload: {e}"),
    })?;
    match cluster.id() {
        Some(inner) if inner == id => Ok(cluster),
        Some(inner) => Err(StoreError::Corrupted {
            id,
            detail: format!("payload carries id {inner}"),
        }),
        None => Err(StoreError::Corrupted {
            id,
            detail: "payload has no metaInfo".into(),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
