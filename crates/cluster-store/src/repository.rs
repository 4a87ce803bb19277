//! Cluster repository: SQL for the `clusters` table.
//!
//! Stateless, every method takes `&Connection` so the caller decides the
//! transaction scope. Rows travel as [`ClusterRecord`] / raw JSON strings;
//! decoding and identity checks live in the store.

use std::fmt::Write;

use cluster_core::{Cluster, ClusterId, FieldId, RigId};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{Result, StoreError};

/// A cluster encoded for storage: projection columns plus JSON text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterRecord {
    /// Primary key (hyphenated UUID).
    pub id: String,
    /// Header as JSON.
    pub meta_info: String,
    /// Projected `field_id`.
    pub field_id: Option<String>,
    /// Projected `is_single_well`.
    pub is_single_well: bool,
    /// Projected `rig_id`.
    pub rig_id: Option<String>,
    /// Projected `is_fixed_platform`.
    pub is_fixed_platform: bool,
    /// Whole cluster as JSON.
    pub payload: String,
}

impl ClusterRecord {
    /// Encode `cluster` for storage.
    ///
    /// Fails with [`StoreError::InvalidArgument`] when the header is missing or
    /// carries the nil identifier.
    pub fn encode(cluster: &Cluster) -> Result<Self> {
        let meta = cluster
            .meta_info
            .as_ref()
            .ok_or_else(|| StoreError::InvalidArgument("cluster has no metaInfo".into()))?;
        if meta.id.is_nil() {
            return Err(StoreError::InvalidArgument(
                "cluster metaInfo.id is empty".into(),
            ));
        }

        Ok(Self {
            id: meta.id.to_string(),
            meta_info: serde_json::to_string(meta)?,
            field_id: cluster.field_id.map(|id| id.to_string()),
            is_single_well: cluster.is_single_well,
            rig_id: cluster.rig_id.map(|id| id.to_string()),
            is_fixed_platform: cluster.is_fixed_platform,
            payload: serde_json::to_string(cluster)?,
        })
    }
}

/// Projection filter for [`ClusterRepo::find_ids`]. Unset fields match all rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterFilter {
    /// Only clusters in this field.
    pub field_id: Option<FieldId>,
    /// Only clusters associated with this rig.
    pub rig_id: Option<RigId>,
    /// Only single wells (`true`) or only multi-slot clusters (`false`).
    pub is_single_well: Option<bool>,
    /// Only fixed platforms (`true`) or only floating/moveable rigs (`false`).
    pub is_fixed_platform: Option<bool>,
}

impl ClusterFilter {
    /// Whether no criteria are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Cluster repository: stateless, every method takes `&Connection`.
pub struct ClusterRepo;

impl ClusterRepo {
    /// Number of rows.
    pub fn count(conn: &Connection) -> Result<usize> {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM clusters", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Whether a row with this primary key exists.
    pub fn exists(conn: &Connection, id: ClusterId) -> Result<bool> {
        let found: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM clusters WHERE id = ?1)",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// Every primary key, in key order.
    pub fn list_ids(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT id FROM clusters ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// `(id, meta_info)` for every row.
    pub fn list_headers(conn: &Connection) -> Result<Vec<(String, String)>> {
        let mut stmt = conn.prepare("SELECT id, meta_info FROM clusters ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Payload of the row with this primary key.
    pub fn get_payload(conn: &Connection, id: ClusterId) -> Result<Option<String>> {
        let payload = conn
            .query_row(
                "SELECT payload FROM clusters WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    /// `(id, payload)` for every row.
    pub fn list_payloads(conn: &Connection) -> Result<Vec<(String, String)>> {
        let mut stmt = conn.prepare("SELECT id, payload FROM clusters ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Insert a new row. Returns the number of rows inserted.
    pub fn insert(conn: &Connection, record: &ClusterRecord) -> Result<usize> {
        let changed = conn.execute(
            "INSERT INTO clusters (id, meta_info, field_id, is_single_well,
                 rig_id, is_fixed_platform, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.meta_info,
                record.field_id,
                record.is_single_well,
                record.rig_id,
                record.is_fixed_platform,
                record.payload
            ],
        )?;
        Ok(changed)
    }

    /// Overwrite the row keyed by `record.id`. Returns the number of rows updated.
    pub fn update(conn: &Connection, record: &ClusterRecord) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE clusters
             SET meta_info = ?1, field_id = ?2, is_single_well = ?3,
                 rig_id = ?4, is_fixed_platform = ?5, payload = ?6
             WHERE id = ?7",
            params![
                record.meta_info,
                record.field_id,
                record.is_single_well,
                record.rig_id,
                record.is_fixed_platform,
                record.payload,
                record.id
            ],
        )?;
        Ok(changed)
    }

    /// Delete the row with this primary key. Returns the number of rows deleted.
    pub fn delete(conn: &Connection, id: ClusterId) -> Result<usize> {
        let changed = conn.execute(
            "DELETE FROM clusters WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(changed)
    }

    /// Delete every row. Returns the number of rows deleted.
    pub fn delete_all(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM clusters", [])?)
    }

    /// Primary keys of rows matching `filter`, in key order.
    pub fn find_ids(conn: &Connection, filter: &ClusterFilter) -> Result<Vec<String>> {
        let mut sql = String::from("SELECT id FROM clusters WHERE 1=1");
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(field_id) = filter.field_id {
            let _ = write!(sql, " AND field_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(field_id.to_string()));
        }
        if let Some(rig_id) = filter.rig_id {
            let _ = write!(sql, " AND rig_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(rig_id.to_string()));
        }
        if let Some(single) = filter.is_single_well {
            let _ = write!(sql, " AND is_single_well = ?{}", param_values.len() + 1);
            param_values.push(Box::new(single));
        }
        if let Some(fixed) = filter.is_fixed_platform {
            let _ = write!(sql, " AND is_fixed_platform = ?{}", param_values.len() + 1);
            param_values.push(Box::new(fixed));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = param_values.iter().map(Box::as_ref).collect();
        let ids = stmt
            .query_map(params_refs.as_slice(), |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use assert_matches::assert_matches;
    use cluster_core::MetaInfo;

    use super::*;
    use crate::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn record(cluster: &Cluster) -> ClusterRecord {
        ClusterRecord::encode(cluster).unwrap()
    }

    #[test]
    fn encode_requires_header() {
        assert_matches!(
            ClusterRecord::encode(&Cluster::default()),
            Err(StoreError::InvalidArgument(_))
        );
    }

    #[test]
    fn encode_rejects_nil_id() {
        let cluster = Cluster {
            meta_info: Some(MetaInfo::default()),
            ..Cluster::default()
        };
        assert_matches!(
            ClusterRecord::encode(&cluster),
            Err(StoreError::InvalidArgument(_))
        );
    }

    #[test]
    fn encode_projects_columns() {
        let mut cluster = Cluster::with_id(ClusterId::new());
        let field = FieldId::new();
        cluster.field_id = Some(field);
        cluster.is_fixed_platform = true;
        let rec = record(&cluster);
        assert_eq!(rec.field_id, Some(field.to_string()));
        assert!(rec.rig_id.is_none());
        assert!(rec.is_fixed_platform);
        assert!(!rec.is_single_well);
        assert!(rec.meta_info.contains(&rec.id));
    }

    #[test]
    fn insert_then_read() {
        let conn = setup();
        let cluster = Cluster::with_id(ClusterId::new());
        let id = cluster.id().unwrap();
        assert_eq!(ClusterRepo::insert(&conn, &record(&cluster)).unwrap(), 1);

        assert_eq!(ClusterRepo::count(&conn).unwrap(), 1);
        assert!(ClusterRepo::exists(&conn, id).unwrap());
        assert_eq!(ClusterRepo::list_ids(&conn).unwrap(), vec![id.to_string()]);
        assert!(ClusterRepo::get_payload(&conn, id).unwrap().is_some());
        assert!(ClusterRepo::get_payload(&conn, ClusterId::new()).unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_is_constraint_violation() {
        let conn = setup();
        let rec = record(&Cluster::with_id(ClusterId::new()));
        ClusterRepo::insert(&conn, &rec).unwrap();
        let err = ClusterRepo::insert(&conn, &rec).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn update_missing_row_changes_nothing() {
        let conn = setup();
        let rec = record(&Cluster::with_id(ClusterId::new()));
        assert_eq!(ClusterRepo::update(&conn, &rec).unwrap(), 0);
    }

    #[test]
    fn delete_and_delete_all() {
        let conn = setup();
        let a = Cluster::with_id(ClusterId::new());
        ClusterRepo::insert(&conn, &record(&a)).unwrap();
        ClusterRepo::insert(&conn, &record(&Cluster::with_id(ClusterId::new()))).unwrap();
        ClusterRepo::insert(&conn, &record(&Cluster::with_id(ClusterId::new()))).unwrap();

        assert_eq!(ClusterRepo::delete(&conn, a.id().unwrap()).unwrap(), 1);
        assert_eq!(ClusterRepo::delete(&conn, a.id().unwrap()).unwrap(), 0);
        assert_eq!(ClusterRepo::delete_all(&conn).unwrap(), 2);
        assert_eq!(ClusterRepo::count(&conn).unwrap(), 0);
    }

    #[test]
    fn find_ids_by_projection() {
        let conn = setup();
        let field = FieldId::new();
        let rig = RigId::new();

        let mut a = Cluster::with_id(ClusterId::new());
        a.field_id = Some(field);
        a.is_single_well = true;
        let mut b = Cluster::with_id(ClusterId::new());
        b.field_id = Some(field);
        b.rig_id = Some(rig);
        b.is_fixed_platform = true;
        let c = Cluster::with_id(ClusterId::new());
        for cl in [&a, &b, &c] {
            ClusterRepo::insert(&conn, &record(cl)).unwrap();
        }
        let a_id = a.id().unwrap().to_string();
        let b_id = b.id().unwrap().to_string();

        let by_field = ClusterFilter {
            field_id: Some(field),
            ..ClusterFilter::default()
        };
        let mut ids = ClusterRepo::find_ids(&conn, &by_field).unwrap();
        ids.sort();
        let mut expected = vec![a_id.clone(), b_id.clone()];
        expected.sort();
        assert_eq!(ids, expected);

        let single = ClusterFilter {
            field_id: Some(field),
            is_single_well: Some(true),
            ..ClusterFilter::default()
        };
        assert_eq!(ClusterRepo::find_ids(&conn, &single).unwrap(), vec![a_id]);

        let rig_fixed = ClusterFilter {
            rig_id: Some(rig),
            is_fixed_platform: Some(true),
            ..ClusterFilter::default()
        };
        assert_eq!(ClusterRepo::find_ids(&conn, &rig_fixed).unwrap(), vec![b_id]);

        assert!(ClusterFilter::default().is_empty());
        assert_eq!(
            ClusterRepo::find_ids(&conn, &ClusterFilter::default())
                .unwrap()
                .len(),
            3
        );
    }
}
