//! Audit errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Entry violates an audit invariant.
    #[error("invalid audit entry: {0}")]
    InvalidEntry(String),

    #[error("audit storage error: {0}")]
    Storage(String),

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The writer has shut down.
    #[error("audit writer closed")]
    Closed,
}

impl AuditError {
    /// Whether retrying the same write could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
