//! Storage and querying of the StaffGate audit trail.
//!
//! Both stores are append-only and hash-chained; neither exposes an update
//! or delete path.

mod error;
mod memory;
mod query;
mod sqlite;

pub use error::IntegrityError;
pub use memory::InMemoryAuditStore;
pub use query::AuditQuery;
pub use sqlite::SqliteAuditStore;
