//! Read side of the audit trail.

use async_trait::async_trait;
use staffgate_audit_types::{AuditError, AuditFilter, AuditPage, PageRequest};

/// Lists stored entries, ordered by timestamp then storage sequence.
#[async_trait]
pub trait AuditQuery: Send + Sync {
    async fn list_audit_entries(&self, filter: &AuditFilter, page: PageRequest) -> Result<AuditPage, AuditError>;
}
