//! SQLite-backed audit store.

use crate::error::IntegrityError;
use crate::query::AuditQuery;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use staffgate_audit_capture::{AuditSink, WriteReceipt};
use staffgate_audit_immutability::{hash_entry, ChainLink, HashChain};
use staffgate_audit_types::{AuditEntry, AuditError, AuditFilter, AuditPage, PageRequest};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_entries (
    sequence          INTEGER PRIMARY KEY,
    id                TEXT NOT NULL UNIQUE,
    request_id        TEXT NOT NULL UNIQUE,
    actor_id          TEXT NOT NULL,
    original_actor_id TEXT,
    is_impersonated   INTEGER NOT NULL,
    action            TEXT NOT NULL,
    resource          TEXT NOT NULL,
    timestamp         TEXT NOT NULL,
    entry_json        TEXT NOT NULL,
    entry_hash        TEXT NOT NULL,
    prev_hash         TEXT NOT NULL,
    link_hash         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_actor ON audit_entries(actor_id);
CREATE INDEX IF NOT EXISTS idx_audit_original_actor ON audit_entries(original_actor_id);
CREATE INDEX IF NOT EXISTS idx_audit_resource ON audit_entries(resource);
CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_entries(timestamp, sequence);

CREATE TRIGGER IF NOT EXISTS audit_entries_no_update
BEFORE UPDATE ON audit_entries
BEGIN
    SELECT RAISE(ABORT, 'audit entries are append-only');
END;

CREATE TRIGGER IF NOT EXISTS audit_entries_no_delete
BEFORE DELETE ON audit_entries
BEGIN
    SELECT RAISE(ABORT, 'audit entries are append-only');
END;
"#;

fn storage(e: impl std::fmt::Display) -> AuditError {
    AuditError::Storage(e.to_string())
}

/// Sortable text form used for the timestamp column and range bounds.
/// Full nanosecond precision, matching `AuditFilter::matches`.
fn timestamp_key(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Append-only audit table with hash-chain columns.
#[derive(Clone)]
pub struct SqliteAuditStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditStore {
    /// Open or create a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let conn = Connection::open(path.as_ref()).map_err(storage)?;
        info!(path = %path.as_ref().display(), "opened audit store");
        Self::with_connection(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> Result<Self, AuditError> {
        Self::with_connection(Connection::open_in_memory().map_err(storage)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AuditError> {
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Number of stored entries.
    pub fn count(&self) -> Result<u64, AuditError> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM audit_entries", [], |row| row.get(0))
            .map_err(storage)?;
        Ok(count as u64)
    }

    /// Recheck every stored entry against its chain. Returns the number
    /// checked.
    pub fn verify_integrity(&self) -> Result<usize, IntegrityError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT sequence, entry_json, entry_hash, prev_hash, link_hash
                 FROM audit_entries ORDER BY sequence",
            )
            .map_err(storage)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(storage)?;

        let mut entries = Vec::new();
        let mut links = Vec::new();
        for row in rows {
            let (sequence, json, entry_hash, prev_hash, link_hash) = row.map_err(storage)?;
            entries.push(serde_json::from_str::<AuditEntry>(&json).map_err(AuditError::from)?);
            links.push(ChainLink {
                sequence: sequence as u64,
                entry_hash,
                prev_hash,
                link_hash,
            });
        }

        HashChain::from_links(links)?.verify_against(&entries)?;
        Ok(entries.len())
    }

    fn write_blocking(conn: &Mutex<Connection>, entry: &AuditEntry) -> Result<WriteReceipt, AuditError> {
        let mut conn = conn.lock();
        let tx = conn.transaction().map_err(storage)?;

        let request_id = entry.request_id.to_string();
        let exists = tx
            .query_row(
                "SELECT 1 FROM audit_entries WHERE request_id = ?1",
                params![request_id],
                |_| Ok(()),
            )
            .optional()
            .map_err(storage)?
            .is_some();
        if exists {
            return Ok(WriteReceipt::Duplicate);
        }

        let head = tx
            .query_row(
                "SELECT sequence, entry_hash, prev_hash, link_hash
                 FROM audit_entries ORDER BY sequence DESC LIMIT 1",
                [],
                |row| {
                    Ok(ChainLink {
                        sequence: row.get::<_, i64>(0)? as u64,
                        entry_hash: row.get(1)?,
                        prev_hash: row.get(2)?,
                        link_hash: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(storage)?;

        let json = serde_json::to_string(entry)?;
        let entry_hash = hash_entry(entry)?;
        let link = match &head {
            Some(previous) => ChainLink::next(entry_hash, previous),
            None => ChainLink::first(entry_hash),
        };

        tx.execute(
            "INSERT INTO audit_entries (
                sequence, id, request_id, actor_id, original_actor_id, is_impersonated,
                action, resource, timestamp, entry_json, entry_hash, prev_hash, link_hash
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                link.sequence as i64,
                entry.id.to_string(),
                request_id,
                entry.actor_id.to_string(),
                entry.original_actor_id.map(|id| id.to_string()),
                entry.is_impersonated,
                entry.action.as_str(),
                entry.resource,
                timestamp_key(&entry.timestamp),
                json,
                link.entry_hash,
                link.prev_hash,
                link.link_hash,
            ],
        )
        .map_err(storage)?;

        tx.commit().map_err(storage)?;
        Ok(WriteReceipt::Stored {
            sequence: link.sequence,
        })
    }

    fn list_blocking(conn: &Mutex<Connection>, filter: &AuditFilter, page: PageRequest) -> Result<AuditPage, AuditError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(id) = filter.actor_id {
            clauses.push("actor_id = ?");
            values.push(Box::new(id.to_string()));
        }
        if let Some(id) = filter.original_actor_id {
            clauses.push("original_actor_id = ?");
            values.push(Box::new(id.to_string()));
        }
        if let Some(resource) = &filter.resource {
            clauses.push("resource = ?");
            values.push(Box::new(resource.clone()));
        }
        if let Some(from) = &filter.from {
            clauses.push("timestamp >= ?");
            values.push(Box::new(timestamp_key(from)));
        }
        if let Some(to) = &filter.to {
            clauses.push("timestamp < ?");
            values.push(Box::new(timestamp_key(to)));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = conn.lock();
        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM audit_entries {where_sql}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .map_err(storage)?;

        values.push(Box::new(i64::from(page.limit())));
        values.push(Box::new(page.offset() as i64));
        let mut stmt = conn
            .prepare(&format!(
                "SELECT entry_json FROM audit_entries {where_sql}
                 ORDER BY timestamp, sequence LIMIT ? OFFSET ?"
            ))
            .map_err(storage)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))
            .map_err(storage)?;

        let mut items = Vec::new();
        for json in rows {
            let json = json.map_err(storage)?;
            items.push(serde_json::from_str(&json)?);
        }

        Ok(AuditPage::new(items, page, total as u64))
    }
}

#[async_trait]
impl AuditSink for SqliteAuditStore {
    async fn write(&self, entry: &AuditEntry) -> Result<WriteReceipt, AuditError> {
        entry.validate()?;

        let conn = self.conn.clone();
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || Self::write_blocking(&conn, &entry))
            .await
            .map_err(storage)?
    }
}

#[async_trait]
impl AuditQuery for SqliteAuditStore {
    async fn list_audit_entries(&self, filter: &AuditFilter, page: PageRequest) -> Result<AuditPage, AuditError> {
        let conn = self.conn.clone();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || Self::list_blocking(&conn, &filter, page))
            .await
            .map_err(storage)?
    }
}
