//! Cryptographic hash chain for audit integrity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use staffgate_audit_types::AuditEntry;
use tracing::warn;

/// `prev_hash` of the first link.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A link in the hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    /// Position in the chain, from 0.
    pub sequence: u64,
    /// Hash of the entry's canonical JSON.
    pub entry_hash: String,
    /// Hash of the previous link.
    pub prev_hash: String,
    /// This link's hash.
    pub link_hash: String,
}

impl ChainLink {
    /// First link of a chain.
    pub fn first(entry_hash: String) -> Self {
        Self::build(0, entry_hash, GENESIS_HASH.to_string())
    }

    /// Link following `previous`.
    pub fn next(entry_hash: String, previous: &ChainLink) -> Self {
        Self::build(previous.sequence + 1, entry_hash, previous.link_hash.clone())
    }

    fn build(sequence: u64, entry_hash: String, prev_hash: String) -> Self {
        let link_hash = compute_link_hash(&entry_hash, &prev_hash, sequence);
        Self {
            sequence,
            entry_hash,
            prev_hash,
            link_hash,
        }
    }

    /// Verify this link's own hash.
    pub fn verify(&self) -> bool {
        compute_link_hash(&self.entry_hash, &self.prev_hash, self.sequence) == self.link_hash
    }

    /// Verify continuity with the previous link.
    pub fn follows(&self, previous: &ChainLink) -> bool {
        self.prev_hash == previous.link_hash && self.sequence == previous.sequence + 1
    }
}

/// Hash of an entry's canonical JSON.
///
/// `serde_json` emits struct fields in declaration order and object keys of
/// `Value` in sorted order, so equal entries always hash equal.
pub fn hash_entry(entry: &AuditEntry) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(entry)?;
    Ok(hex_sha256(&bytes))
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn compute_link_hash(entry_hash: &str, prev_hash: &str, sequence: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(entry_hash.as_bytes());
    hasher.update(prev_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a sequence of links on its own: every hash, every continuity step,
/// and a genesis first link.
pub fn verify_links(links: &[ChainLink]) -> Result<(), ChainError> {
    let Some(first) = links.first() else {
        return Ok(());
    };

    if first.sequence != 0 || first.prev_hash != GENESIS_HASH {
        return Err(ChainError::BrokenChain { at_sequence: first.sequence });
    }

    for (i, link) in links.iter().enumerate() {
        if !link.verify() {
            return Err(ChainError::InvalidLink { sequence: link.sequence });
        }
        if i > 0 && !link.follows(&links[i - 1]) {
            return Err(ChainError::BrokenChain { at_sequence: link.sequence });
        }
    }

    Ok(())
}

/// Append-only chain of links.
#[derive(Debug, Clone, Default)]
pub struct HashChain {
    links: Vec<ChainLink>,
}

impl HashChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored links, verifying them.
    pub fn from_links(links: Vec<ChainLink>) -> Result<Self, ChainError> {
        verify_links(&links)?;
        Ok(Self { links })
    }

    /// The link that `entry` would get, without appending it.
    pub fn next_link(&self, entry: &AuditEntry) -> Result<ChainLink, ChainError> {
        let entry_hash = hash_entry(entry)?;
        Ok(match self.links.last() {
            Some(previous) => ChainLink::next(entry_hash, previous),
            None => ChainLink::first(entry_hash),
        })
    }

    /// Append `entry` and return its link.
    pub fn append(&mut self, entry: &AuditEntry) -> Result<&ChainLink, ChainError> {
        let link = self.next_link(entry)?;
        self.push(link)
    }

    /// Append a link computed with [`HashChain::next_link`].
    pub fn push(&mut self, link: ChainLink) -> Result<&ChainLink, ChainError> {
        let expected = self.links.last().map_or(0, |l| l.sequence + 1);
        let continuous = match self.links.last() {
            Some(previous) => link.follows(previous),
            None => link.prev_hash == GENESIS_HASH && link.sequence == 0,
        };
        if !continuous || !link.verify() {
            return Err(ChainError::BrokenChain { at_sequence: expected });
        }

        self.links.push(link);
        Ok(&self.links[self.links.len() - 1])
    }

    pub fn head(&self) -> Option<&ChainLink> {
        self.links.last()
    }

    pub fn get(&self, sequence: u64) -> Option<&ChainLink> {
        self.links.get(usize::try_from(sequence).ok()?)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Verify the links alone.
    pub fn verify_full(&self) -> Result<(), ChainError> {
        verify_links(&self.links)
    }

    /// Verify the links and that `entries` are exactly the chained entries,
    /// in order and unmodified.
    pub fn verify_against(&self, entries: &[AuditEntry]) -> Result<(), ChainError> {
        self.verify_full()?;

        if entries.len() != self.links.len() {
            warn!(
                stored = entries.len(),
                chained = self.links.len(),
                "audit entry count does not match hash chain"
            );
            return Err(ChainError::LengthMismatch {
                entries: entries.len(),
                links: self.links.len(),
            });
        }

        for (entry, link) in entries.iter().zip(&self.links) {
            if hash_entry(entry)? != link.entry_hash {
                warn!(sequence = link.sequence, request_id = %entry.request_id, "audit entry hash mismatch");
                return Err(ChainError::EntryMismatch { sequence: link.sequence });
            }
        }

        Ok(())
    }
}

/// Chain verification error.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid link at sequence {sequence}")]
    InvalidLink { sequence: u64 },

    #[error("chain is broken at sequence {at_sequence}")]
    BrokenChain { at_sequence: u64 },

    #[error("entry at sequence {sequence} does not match its link")]
    EntryMismatch { sequence: u64 },

    #[error("{entries} entries stored but {links} links chained")]
    LengthMismatch { entries: usize, links: usize },

    #[error("failed to serialize entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffgate_audit_types::{AuditAction, AuditActors};
    use staffgate_common_core::{PrincipalId, RequestId};

    fn entry(resource: &str) -> AuditEntry {
        AuditEntry::builder(AuditAction::Update, resource, AuditActors::direct(PrincipalId::new()), RequestId::new())
            .build()
            .unwrap()
    }

    fn chain_of(entries: &[AuditEntry]) -> HashChain {
        let mut chain = HashChain::new();
        for e in entries {
            chain.append(e).unwrap();
        }
        chain
    }

    #[test]
    fn test_first_link() {
        let link = ChainLink::first("abc".into());
        assert_eq!(link.sequence, 0);
        assert!(link.verify());
        assert_eq!(link.prev_hash, GENESIS_HASH);
    }

    #[test]
    fn test_append_and_verify() {
        let entries = vec![entry("shifts"), entry("staff"), entry("facilities")];
        let chain = chain_of(&entries);

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.head().map(|l| l.sequence), Some(2));
        assert!(chain.verify_against(&entries).is_ok());
    }

    #[test]
    fn test_modified_entry_detected() {
        let mut entries = vec![entry("shifts"), entry("staff")];
        let chain = chain_of(&entries);
        entries[1].resource = "invoices".into();

        assert!(matches!(
            chain.verify_against(&entries),
            Err(ChainError::EntryMismatch { sequence: 1 })
        ));
    }

    #[test]
    fn test_reordered_entries_detected() {
        let mut entries = vec![entry("shifts"), entry("staff")];
        let chain = chain_of(&entries);
        entries.swap(0, 1);

        assert!(chain.verify_against(&entries).is_err());
    }

    #[test]
    fn test_deleted_link_detected() {
        let entries = vec![entry("a.b"), entry("c.d"), entry("e.f")];
        let chain = chain_of(&entries);
        let mut links = chain.links().to_vec();
        links.remove(1);

        assert!(matches!(
            HashChain::from_links(links),
            Err(ChainError::BrokenChain { .. })
        ));
    }

    #[test]
    fn test_push_rejects_foreign_link() {
        let mut chain = chain_of(&[entry("shifts")]);
        let stray = ChainLink::first("deadbeef".into());
        assert!(chain.push(stray).is_err());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_empty_chain_verifies() {
        assert!(HashChain::new().verify_against(&[]).is_ok());
        assert!(HashChain::new().head().is_none());
    }
}
