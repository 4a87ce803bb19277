//! Error types for the cluster store.
//!
//! [`StoreError`] is returned by every store operation. Expected conditions
//! (missing row, zero rows deleted) are ordinary return values, not errors.
//! [`StoreError::kind`] folds each variant into the caller-facing
//! [`OutcomeKind`].

use cluster_core::{ClusterId, OutcomeKind};
use thiserror::Error;

/// Errors that can occur during cluster store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Missing or malformed identifier, or mismatched identity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A cluster with this identifier is already stored.
    #[error("cluster already exists: {0}")]
    Conflict(ClusterId),

    /// The stored row disagrees with its own payload.
    #[error("corrupted record {id}: {detail}")]
    Corrupted {
        /// Primary key of the offending row.
        id: ClusterId,
        /// What is wrong with it.
        detail: String,
    },

    /// A mutating statement touched an unexpected number of rows.
    #[error("{operation} affected {actual} rows, expected {expected}")]
    RowCountMismatch {
        /// Statement kind (`insert`, `update`, ...).
        operation: &'static str,
        /// Rows the statement should have touched.
        expected: usize,
        /// Rows it actually touched.
        actual: usize,
    },

    /// No connection could be obtained.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Classify this error for callers.
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::InvalidArgument(_) => OutcomeKind::InvalidArgument,
            Self::Conflict(_) => OutcomeKind::Conflict,
            Self::Sqlite(_)
            | Self::Pool(_)
            | Self::Serde(_)
            | Self::Migration { .. }
            | Self::Corrupted { .. }
            | Self::RowCountMismatch { .. }
            | Self::Unavailable(_) => OutcomeKind::InternalError,
        }
    }

    /// Whether this is a primary-key or other constraint violation.
    pub(crate) fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(code, _))
                if code.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
