//! Tamper evidence for stored audit entries.
//!
//! Every stored entry is linked to its predecessor by a SHA-256 hash chain.
//! Any modification, deletion or reordering of stored entries breaks
//! [`HashChain::verify_against`].

mod hash_chain;

pub use hash_chain::{hash_entry, verify_links, ChainError, ChainLink, HashChain, GENESIS_HASH};
