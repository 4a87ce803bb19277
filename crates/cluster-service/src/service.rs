//! Cluster operations as seen by callers.
//!
//! Each tracked operation first bumps its usage counter, then runs against
//! the store and reports a [`ServiceError`] for every non-success outcome.
//! Internal failures are logged here with the operation name and cluster id.

use std::sync::Arc;

use cluster_core::{Cluster, ClusterId, MetaInfo};
use cluster_store::{ClusterFilter, ClusterStore, ConnectionPool, ConnectionProvider, StoreError};
use cluster_usage::{UsageKind, UsageStatistics, UsageTracker};
use tracing::{error, info, instrument, warn};

use crate::errors::{Result, ServiceError};

/// Store plus usage tracking.
#[derive(Debug)]
pub struct ClusterService<P = ConnectionPool> {
    store: ClusterStore<P>,
    usage: Arc<UsageTracker>,
}

impl<P: ConnectionProvider> ClusterService<P> {
    /// Combine a store with the process-wide usage tracker.
    pub const fn new(store: ClusterStore<P>, usage: Arc<UsageTracker>) -> Self {
        Self { store, usage }
    }

    /// The underlying store.
    pub const fn store(&self) -> &ClusterStore<P> {
        &self.store
    }

    /// The shared usage tracker.
    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Identifiers of every stored cluster.
    #[instrument(skip_all)]
    pub fn all_ids(&self) -> Result<Vec<ClusterId>> {
        self.usage.increment(UsageKind::GetAllClusterId);
        self.store
            .list_ids()
            .map_err(|e| classify("all_ids", None, e))
    }

    /// Headers of every stored cluster.
    #[instrument(skip_all)]
    pub fn all_meta_info(&self) -> Result<Vec<MetaInfo>> {
        self.usage.increment(UsageKind::GetAllClusterMetaInfo);
        self.store
            .list_headers()
            .map_err(|e| classify("all_meta_info", None, e))
    }

    /// The cluster `id`.
    #[instrument(skip_all, fields(cluster_id = %id))]
    pub fn by_id(&self, id: ClusterId) -> Result<Cluster> {
        self.usage.increment(UsageKind::GetClusterById);
        match self.store.get_by_id(id) {
            Ok(Some(cluster)) => Ok(cluster),
            Ok(None) => Err(ServiceError::NotFound(id)),
            Err(e) => Err(classify("by_id", Some(id), e)),
        }
    }

    /// Every stored cluster; `None` stands in for a row that failed to decode.
    #[instrument(skip_all)]
    pub fn all(&self) -> Result<Vec<Option<Cluster>>> {
        self.usage.increment(UsageKind::GetAllCluster);
        self.store.list_all().map_err(|e| classify("all", None, e))
    }

    /// Store a new cluster.
    #[instrument(skip_all)]
    pub fn post(&self, cluster: &Cluster) -> Result<()> {
        self.usage.increment(UsageKind::PostCluster);
        let id = cluster.id();
        self.store.add(cluster).map_err(|e| classify("post", id, e))?;
        info!(cluster_id = ?id, "cluster created");
        Ok(())
    }

    /// Replace the cluster `id`. The cluster must carry `id` in its header.
    #[instrument(skip_all, fields(cluster_id = %id))]
    pub fn put_by_id(&self, id: ClusterId, cluster: &Cluster) -> Result<()> {
        self.usage.increment(UsageKind::PutClusterById);
        if id.is_nil() || cluster.id() != Some(id) {
            warn!("cluster missing, badly formed, or its id does not match the id to update");
            return Err(ServiceError::InvalidArgument(format!(
                "cluster metaInfo.id must equal {id}"
            )));
        }
        if !self.exists("put_by_id", id)? {
            warn!("cluster to update not found");
            return Err(ServiceError::NotFound(id));
        }
        self.store
            .update_by_id(id, cluster)
            .map_err(|e| classify("put_by_id", Some(id), e))?;
        info!("cluster updated");
        Ok(())
    }

    /// Delete the cluster `id`.
    #[instrument(skip_all, fields(cluster_id = %id))]
    pub fn delete_by_id(&self, id: ClusterId) -> Result<()> {
        self.usage.increment(UsageKind::DeleteClusterById);
        if id.is_nil() {
            return Err(ServiceError::InvalidArgument("cluster id is empty".into()));
        }
        if !self.exists("delete_by_id", id)? {
            warn!("cluster to delete not found");
            return Err(ServiceError::NotFound(id));
        }
        if !self
            .store
            .delete_by_id(id)
            .map_err(|e| classify("delete_by_id", Some(id), e))?
        {
            // removed concurrently between the check and the delete
            return Err(ServiceError::NotFound(id));
        }
        info!("cluster deleted");
        Ok(())
    }

    /// Current usage counters, including increments not yet backed up.
    pub fn usage_statistics(&self) -> UsageStatistics {
        self.usage.snapshot()
    }

    /// Number of stored clusters.
    pub fn count(&self) -> Result<usize> {
        self.store
            .try_count()
            .map_err(|e| classify("count", None, e))
    }

    /// Identifiers of clusters matching `filter`.
    pub fn find(&self, filter: &ClusterFilter) -> Result<Vec<ClusterId>> {
        self.store
            .find_ids(filter)
            .map_err(|e| classify("find", None, e))
    }

    /// Delete every cluster. Returns the number removed.
    pub fn clear(&self) -> Result<usize> {
        self.store.clear().map_err(|e| classify("clear", None, e))
    }

    fn exists(&self, operation: &'static str, id: ClusterId) -> Result<bool> {
        self.store
            .exists(id)
            .map_err(|e| classify(operation, Some(id), e))
    }
}

/// Map a store error to its caller outcome, logging backend faults.
fn classify(operation: &'static str, id: Option<ClusterId>, err: StoreError) -> ServiceError {
    let err = ServiceError::from(err);
    if let ServiceError::Internal(ref source) = err {
        match id {
            Some(id) => error!(operation, cluster_id = %id, error = %source, "store failure"),
            None => error!(operation, error = %source, "store failure"),
        }
    }
    err
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use cluster_core::{FieldId, OutcomeKind};
    use cluster_store::connection::PooledConnection;

    use super::*;

    /// Provider whose backend is always down.
    struct Unreachable;

    impl ConnectionProvider for Unreachable {
        type Connection = PooledConnection;

        fn get_connection(&self) -> cluster_store::Result<PooledConnection> {
            Err(StoreError::Unavailable("backend offline".into()))
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        service: ClusterService,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let usage = Arc::new(UsageTracker::load_or_create(
            dir.path().join("history.json"),
            Duration::from_secs(300),
        ));
        let store = ClusterStore::in_memory().unwrap();
        Fixture {
            _dir: dir,
            service: ClusterService::new(store, usage),
        }
    }

    fn cluster() -> Cluster {
        let mut cluster = Cluster::with_id(ClusterId::new());
        cluster.field_id = Some(FieldId::new());
        cluster
    }

    #[test]
    fn post_then_get() {
        let f = fixture();
        let c = cluster();
        f.service.post(&c).unwrap();
        assert_eq!(f.service.by_id(c.id().unwrap()).unwrap(), c);
        assert_eq!(f.service.all_ids().unwrap(), vec![c.id().unwrap()]);
        assert_eq!(f.service.all_meta_info().unwrap().len(), 1);
        assert_eq!(f.service.all().unwrap(), vec![Some(c)]);
    }

    #[test]
    fn post_duplicate_is_conflict() {
        let f = fixture();
        let c = cluster();
        f.service.post(&c).unwrap();
        let err = f.service.post(&c).unwrap_err();
        assert_eq!(err.kind(), OutcomeKind::Conflict);
    }

    #[test]
    fn post_without_header_is_invalid() {
        let f = fixture();
        assert_matches!(
            f.service.post(&Cluster::default()),
            Err(ServiceError::InvalidArgument(_))
        );
    }

    #[test]
    fn get_unknown_is_not_found() {
        let f = fixture();
        let id = ClusterId::new();
        assert_matches!(f.service.by_id(id), Err(ServiceError::NotFound(i)) if i == id);
        assert_matches!(
            f.service.by_id(ClusterId::nil()),
            Err(ServiceError::InvalidArgument(_))
        );
    }

    #[test]
    fn put_preconditions() {
        let f = fixture();
        let mut c = cluster();
        let id = c.id().unwrap();

        assert_matches!(f.service.put_by_id(id, &c), Err(ServiceError::NotFound(_)));
        f.service.post(&c).unwrap();
        assert_matches!(
            f.service.put_by_id(ClusterId::new(), &c),
            Err(ServiceError::InvalidArgument(_))
        );

        c.name = Some("renamed".into());
        f.service.put_by_id(id, &c).unwrap();
        assert_eq!(f.service.by_id(id).unwrap().name.as_deref(), Some("renamed"));
    }

    #[test]
    fn delete_twice_is_not_found() {
        let f = fixture();
        let c = cluster();
        let id = c.id().unwrap();
        f.service.post(&c).unwrap();

        f.service.delete_by_id(id).unwrap();
        assert_matches!(f.service.delete_by_id(id), Err(ServiceError::NotFound(_)));
    }

    #[test]
    fn every_tracked_call_is_counted() {
        let f = fixture();
        let c = cluster();
        let id = c.id().unwrap();

        f.service.all_ids().unwrap();
        f.service.all_meta_info().unwrap();
        f.service.post(&c).unwrap();
        f.service.post(&c).unwrap_err();
        f.service.by_id(id).unwrap();
        f.service.all().unwrap();
        f.service.put_by_id(id, &c).unwrap();
        f.service.delete_by_id(id).unwrap();
        f.service.count().unwrap();

        let stats = f.service.usage_statistics();
        assert_eq!(stats.total(UsageKind::GetAllClusterId), 1);
        assert_eq!(stats.total(UsageKind::GetAllClusterMetaInfo), 1);
        assert_eq!(stats.total(UsageKind::PostCluster), 2);
        assert_eq!(stats.total(UsageKind::GetClusterById), 1);
        assert_eq!(stats.total(UsageKind::GetAllCluster), 1);
        assert_eq!(stats.total(UsageKind::PutClusterById), 1);
        assert_eq!(stats.total(UsageKind::DeleteClusterById), 1);
    }

    #[test]
    fn find_count_clear() {
        let f = fixture();
        let a = cluster();
        let mut b = cluster();
        b.field_id = a.field_id;
        b.is_single_well = true;
        f.service.post(&a).unwrap();
        f.service.post(&b).unwrap();
        f.service.post(&cluster()).unwrap();

        let filter = ClusterFilter {
            field_id: a.field_id,
            is_single_well: Some(true),
            ..ClusterFilter::default()
        };
        assert_eq!(f.service.find(&filter).unwrap(), vec![b.id().unwrap()]);
        assert_eq!(f.service.count().unwrap(), 3);
        assert_eq!(f.service.clear().unwrap(), 3);
        assert_eq!(f.service.count().unwrap(), 0);
    }

    #[test]
    fn backend_down_is_internal() {
        let dir = tempfile::tempdir().unwrap();
        let usage = Arc::new(UsageTracker::load_or_create(
            dir.path().join("history.json"),
            Duration::from_secs(300),
        ));
        let service = ClusterService::new(ClusterStore::new(Unreachable), usage);

        assert_eq!(service.all_ids().unwrap_err().kind(), OutcomeKind::InternalError);
        assert_eq!(
            service.by_id(ClusterId::new()).unwrap_err().kind(),
            OutcomeKind::InternalError
        );
        assert_eq!(
            service.delete_by_id(ClusterId::new()).unwrap_err().kind(),
            OutcomeKind::InternalError
        );
        assert_eq!(service.usage_statistics().total(UsageKind::GetAllClusterId), 1);
    }
}
