//! # cluster-service
//!
//! The caller layer over [`cluster_store`] and [`cluster_usage`]: every
//! operation is counted, then translated into either a value or a
//! [`ServiceError`] whose [`kind`](ServiceError::kind) names the outcome.
//!
//! The `cluster` binary exposes the same operations on the command line and
//! maps outcomes to exit codes with [`exit_code`].

#![deny(unsafe_code)]

pub mod errors;
pub mod service;

pub use errors::{Result, ServiceError, exit_code};
pub use service::ClusterService;
