//! Integrity check failures.

use staffgate_audit_immutability::ChainError;
use staffgate_audit_types::AuditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrityError {
    /// The stored trail no longer matches its hash chain.
    #[error("audit trail tampered: {0}")]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}
