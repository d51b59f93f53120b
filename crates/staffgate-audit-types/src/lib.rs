//! Audit entry types for StaffGate.

mod action;
mod actors;
mod entry;
mod error;
mod filter;
mod id;

pub use action::AuditAction;
pub use actors::AuditActors;
pub use entry::{AuditEntry, AuditEntryBuilder, AuditOutcome};
pub use error::AuditError;
pub use filter::{AuditFilter, AuditPage, PageRequest, MAX_PER_PAGE};
pub use id::AuditEntryId;
