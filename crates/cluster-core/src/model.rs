//! Cluster domain model.
//!
//! A [`Cluster`] groups the slots of a drilling site. It is persisted whole as
//! a JSON payload; a handful of scalar fields are also projected into indexed
//! columns by the store. The header ([`MetaInfo`]) carries the identifier
//! that must agree with the row's primary key.
//!
//! Physical values are kept as opaque [`GaussianProperty`] pairs. Units,
//! datums and value validation belong to other services.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ClusterId, FieldId, RigId, SlotId};

/// Header block of a persisted cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaInfo {
    /// Identity of the cluster. Must match the row's primary key.
    pub id: ClusterId,
    /// Host serving the record, if published by a service.
    pub http_host_name: Option<String>,
    /// Base path on that host.
    pub http_host_base_path: Option<String>,
    /// Endpoint under the base path.
    pub http_endpoint: Option<String>,
    /// When the cluster was created.
    pub creation_date: Option<DateTime<Utc>>,
    /// When the cluster was last modified.
    pub last_modification_date: Option<DateTime<Utc>>,
}

impl MetaInfo {
    /// Header for `id` stamped with the current time as both creation and
    /// modification date.
    #[must_use]
    pub fn new(id: ClusterId) -> Self {
        let now = Utc::now();
        Self {
            id,
            creation_date: Some(now),
            last_modification_date: Some(now),
            ..Self::default()
        }
    }
}

/// A measured value with a Gaussian uncertainty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GaussianProperty {
    /// Mean value in SI units.
    pub mean: Option<f64>,
    /// Standard deviation in SI units.
    pub standard_deviation: Option<f64>,
}

impl GaussianProperty {
    /// A value with the given mean and standard deviation.
    #[must_use]
    pub const fn new(mean: f64, standard_deviation: f64) -> Self {
        Self {
            mean: Some(mean),
            standard_deviation: Some(standard_deviation),
        }
    }
}

/// A slot of a cluster, positioned relative to the cluster reference point.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Slot {
    /// Key of the slot inside its cluster.
    pub id: SlotId,
    /// Display name.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// When the slot was created.
    pub creation_date: Option<DateTime<Utc>>,
    /// When the slot was last modified.
    pub last_modification_date: Option<DateTime<Utc>>,
    /// Latitude of the slot (WGS84).
    pub latitude: Option<GaussianProperty>,
    /// Longitude of the slot (WGS84).
    pub longitude: Option<GaussianProperty>,
}

/// A drilling-site cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cluster {
    /// Header; required for persistence.
    pub meta_info: Option<MetaInfo>,
    /// Display name.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// When the cluster data was created.
    pub creation_date: Option<DateTime<Utc>>,
    /// When the cluster data was last modified.
    pub last_modification_date: Option<DateTime<Utc>>,
    /// Field the cluster belongs to.
    pub field_id: Option<FieldId>,
    /// `true` when the "cluster" is really a single well.
    pub is_single_well: bool,
    /// Rig associated with the cluster, if any.
    pub rig_id: Option<RigId>,
    /// `true` for a fixed platform, `false` for a floating or moveable rig.
    pub is_fixed_platform: bool,
    /// Latitude of the reference point (WGS84).
    pub reference_latitude: Option<GaussianProperty>,
    /// Longitude of the reference point (WGS84).
    pub reference_longitude: Option<GaussianProperty>,
    /// Vertical depth of the reference point.
    pub reference_depth: Option<GaussianProperty>,
    /// Vertical depth of the ground level or mud line.
    pub ground_mud_line_depth: Option<GaussianProperty>,
    /// Vertical depth of the top water level.
    pub top_water_depth: Option<GaussianProperty>,
    /// Slots keyed by their own identifier.
    pub slots: Option<BTreeMap<SlotId, Slot>>,
}

impl Cluster {
    /// A cluster with a fresh header for `id` and every other field at its default.
    #[must_use]
    pub fn with_id(id: ClusterId) -> Self {
        Self {
            meta_info: Some(MetaInfo::new(id)),
            ..Self::default()
        }
    }

    /// The identifier carried in the header, if there is a header.
    #[must_use]
    pub fn id(&self) -> Option<ClusterId> {
        self.meta_info.as_ref().map(|m| m.id)
    }

    /// Insert `slot` keyed by its identifier, replacing any slot with the same id.
    pub fn insert_slot(&mut self, slot: Slot) -> Option<Slot> {
        self.slots.get_or_insert_with(BTreeMap::new).insert(slot.id, slot)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
