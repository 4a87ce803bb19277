//! Caller-facing error type.
//!
//! [`ServiceError`] has one variant per non-success [`OutcomeKind`]. Store
//! faults, corrupted records included, collapse into
//! [`ServiceError::Internal`].

use cluster_core::{ClusterId, OutcomeKind};
use cluster_store::StoreError;
use thiserror::Error;

/// Errors returned by [`ClusterService`](crate::ClusterService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input, or mismatched identity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No cluster with this identifier.
    #[error("cluster not found: {0}")]
    NotFound(ClusterId),

    /// A cluster with this identifier already exists.
    #[error("cluster already exists: {0}")]
    Conflict(ClusterId),

    /// Backend failure or corrupted data.
    #[error("internal error: {0}")]
    Internal(#[source] StoreError),
}

impl ServiceError {
    /// Classify this error.
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::InvalidArgument(_) => OutcomeKind::InvalidArgument,
            Self::NotFound(_) => OutcomeKind::NotFound,
            Self::Conflict(_) => OutcomeKind::Conflict,
            Self::Internal(_) => OutcomeKind::InternalError,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            StoreError::Conflict(id) => Self::Conflict(id),
            other => Self::Internal(other),
        }
    }
}

/// Process exit code for an outcome.
pub const fn exit_code(kind: OutcomeKind) -> u8 {
    match kind {
        OutcomeKind::Success => 0,
        OutcomeKind::InternalError => 1,
        OutcomeKind::InvalidArgument => 2,
        OutcomeKind::NotFound => 3,
        OutcomeKind::Conflict => 4,
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
