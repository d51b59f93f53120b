//! In-memory audit store.

use crate::error::IntegrityError;
use crate::query::AuditQuery;
use async_trait::async_trait;
use parking_lot::RwLock;
use staffgate_audit_capture::{AuditSink, WriteReceipt};
use staffgate_audit_immutability::HashChain;
use staffgate_audit_types::{AuditEntry, AuditError, AuditFilter, AuditPage, PageRequest};
use staffgate_common_core::RequestId;
use std::collections::HashSet;

#[derive(Default)]
struct Trail {
    entries: Vec<AuditEntry>,
    chain: HashChain,
    request_ids: HashSet<RequestId>,
}

/// Hash-chained trail held in memory.
#[derive(Default)]
pub struct InMemoryAuditStore {
    trail: RwLock<Trail>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trail.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored entry in storage order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.trail.read().entries.clone()
    }

    /// Recheck every entry against the chain. Returns the number checked.
    pub fn verify_integrity(&self) -> Result<usize, IntegrityError> {
        let trail = self.trail.read();
        trail.chain.verify_against(&trail.entries)?;
        Ok(trail.entries.len())
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditStore {
    async fn write(&self, entry: &AuditEntry) -> Result<WriteReceipt, AuditError> {
        entry.validate()?;

        let mut trail = self.trail.write();
        if trail.request_ids.contains(&entry.request_id) {
            return Ok(WriteReceipt::Duplicate);
        }

        let link = trail
            .chain
            .next_link(entry)
            .map_err(|e| AuditError::Storage(e.to_string()))?;
        let sequence = trail
            .chain
            .push(link)
            .map_err(|e| AuditError::Storage(e.to_string()))?
            .sequence;

        trail.request_ids.insert(entry.request_id);
        trail.entries.push(entry.clone());
        Ok(WriteReceipt::Stored { sequence })
    }
}

#[async_trait]
impl AuditQuery for InMemoryAuditStore {
    async fn list_audit_entries(&self, filter: &AuditFilter, page: PageRequest) -> Result<AuditPage, AuditError> {
        let trail = self.trail.read();

        let mut matching: Vec<(usize, &AuditEntry)> = trail
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| filter.matches(e))
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| a.timestamp.cmp(&b.timestamp).then(ia.cmp(ib)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|(_, e)| e.clone())
            .collect();

        Ok(AuditPage::new(items, page, total))
    }
}
