//! Audit recording for StaffGate.
//!
//! This crate provides a non-blocking recorder for audit entries. It includes:
//!
//! - The [`AuditSink`] write contract with request-id deduplication
//! - [`AuditContext`], built from a request's authorization context
//! - A bounded queue drained by a retrying background writer
//! - Health counters for write failures

mod context;
mod health;
mod recorder;
mod sink;
mod writer;

pub use context::{AuditChanges, AuditContext};
pub use health::{AuditHealth, AuditHealthSnapshot};
pub use recorder::{AuditRecorder, CaptureConfig};
pub use sink::{AuditSink, WriteReceipt};
pub use writer::AuditWriter;

pub use staffgate_audit_types::{AuditAction, AuditActors, AuditEntry, AuditError, AuditOutcome};
