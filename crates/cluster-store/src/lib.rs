//! # cluster-store
//!
//! `SQLite` persistence for [`Cluster`](cluster_core::Cluster) entities.
//!
//! Each cluster is one row of the `clusters` table: the full entity as a
//! JSON payload, its header as a separate JSON column, and a few scalar
//! projections (`field_id`, `rig_id`, the two flags) for filtering.
//!
//! ## Layers
//!
//! - [`connection`]: `r2d2` pool with per-connection pragmas, and the
//!   [`ConnectionProvider`] seam.
//! - [`migrations`]: versioned schema embedded at compile time.
//! - [`repository`]: stateless SQL over a `&Connection`.
//! - [`store`]: [`ClusterStore`], the transactional API with identity checks.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repository;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionPool, ConnectionProvider};
pub use errors::{Result, StoreError};
pub use repository::ClusterFilter;
pub use store::ClusterStore;
