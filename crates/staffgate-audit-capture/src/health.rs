//! Counters for the audit pipeline.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-level audit diagnostics.
///
/// `failed` counts entries that were never stored; any non-zero value means
/// the trail is incomplete.
#[derive(Debug, Default)]
pub struct AuditHealth {
    recorded: AtomicU64,
    stored: AtomicU64,
    duplicates: AtomicU64,
    retries: AtomicU64,
    failed: AtomicU64,
    overflowed: AtomicU64,
    in_flight: AtomicU64,
}

/// Point-in-time copy of [`AuditHealth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditHealthSnapshot {
    pub recorded: u64,
    pub stored: u64,
    pub duplicates: u64,
    pub retries: u64,
    pub failed: u64,
    pub overflowed: u64,
    pub in_flight: u64,
}

impl AuditHealthSnapshot {
    pub fn is_healthy(&self) -> bool {
        self.failed == 0
    }
}

impl AuditHealth {
    pub fn snapshot(&self) -> AuditHealthSnapshot {
        AuditHealthSnapshot {
            recorded: self.recorded.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Acquire),
        }
    }

    pub(crate) fn accepted(&self) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    pub(crate) fn duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    pub(crate) fn retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// An accepted entry that was never stored.
    pub(crate) fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    /// An entry rejected before it was accepted.
    pub(crate) fn rejected(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn overflowed(&self) {
        self.overflowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    fn settle(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
