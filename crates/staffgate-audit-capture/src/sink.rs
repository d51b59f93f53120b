//! Persistence contract for audit entries.

use async_trait::async_trait;
use staffgate_audit_types::{AuditEntry, AuditError};

/// What a sink did with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteReceipt {
    /// Stored at `sequence` in the trail.
    Stored { sequence: u64 },
    /// An entry with the same request id was already stored.
    Duplicate,
}

/// Append-only store for audit entries.
///
/// Implementations never update or delete. Writing an entry whose
/// `request_id` is already stored must succeed with
/// [`WriteReceipt::Duplicate`] and leave the trail unchanged, so a retried
/// write is always safe.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, entry: &AuditEntry) -> Result<WriteReceipt, AuditError>;
}
