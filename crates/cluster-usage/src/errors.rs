//! Usage telemetry error types.
//!
//! These never reach request callers: [`UsageTracker`](crate::UsageTracker)
//! logs and discards them. They surface only from explicit calls such as
//! [`UsageTracker::flush`](crate::UsageTracker::flush).

use thiserror::Error;

/// Errors reading or writing the usage history file.
#[derive(Debug, Error)]
pub enum UsageError {
    /// Filesystem error.
    #[error("usage history io error: {0}")]
    Io(#[from] std::io::Error),
    /// History file is not valid JSON for the snapshot shape.
    #[error("usage history json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for usage telemetry operations.
pub type Result<T> = std::result::Result<T, UsageError>;
