//! Operation outcome classification.
//!
//! Every store and service error classifies into one [`OutcomeKind`]. Callers
//! map the kind onto their own convention (HTTP status, exit code, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a cluster operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The operation completed.
    Success,
    /// No record with the requested identifier.
    NotFound,
    /// Missing or malformed identifier, or mismatched identity.
    InvalidArgument,
    /// A record with the identifier already exists.
    Conflict,
    /// Backend unreachable, transaction failure, or corrupted data.
    InternalError,
}

impl OutcomeKind {
    /// Short classification string for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::Conflict => "conflict",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
