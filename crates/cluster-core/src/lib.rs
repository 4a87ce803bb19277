//! # cluster-core
//!
//! Foundation types shared by every crate in the workspace:
//!
//! - **Identifiers**: UUID-backed newtypes ([`ClusterId`], [`SlotId`], ...)
//!   that keep a field identifier from being passed where a cluster identifier
//!   is expected.
//! - **Domain model**: [`Cluster`], its header [`MetaInfo`], the owned
//!   [`Slot`]s and the [`GaussianProperty`] positional values.
//! - **Outcomes**: [`OutcomeKind`], the result contract callers translate into
//!   their own transport conventions.
//! - **Logging**: [`logging::init_subscriber`] for binaries.

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod model;
pub mod outcome;

pub use ids::{ClusterId, FieldId, RigId, SlotId};
pub use model::{Cluster, GaussianProperty, MetaInfo, Slot};
pub use outcome::OutcomeKind;
