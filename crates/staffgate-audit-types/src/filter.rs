//! Query filters and paging for the audit trail.

use crate::AuditEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staffgate_common_core::PrincipalId;

/// Maximum page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Criteria for listing entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    pub actor_id: Option<PrincipalId>,
    pub original_actor_id: Option<PrincipalId>,
    pub resource: Option<String>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.actor_id.map_or(true, |id| entry.actor_id == id)
            && self
                .original_actor_id
                .map_or(true, |id| entry.original_actor_id == Some(id))
            && self.resource.as_deref().map_or(true, |r| entry.resource == r)
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.to.map_or(true, |to| entry.timestamp < to)
    }
}

/// Page request, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Page number, at least 1.
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size, between 1 and [`MAX_PER_PAGE`].
    pub fn limit(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

/// One page of entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub items: Vec<AuditEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl AuditPage {
    pub fn new(items: Vec<AuditEntry>, request: PageRequest, total_items: u64) -> Self {
        let page = request.page();
        let per_page = request.limit();
        let total_pages = total_items.div_ceil(u64::from(per_page)) as u32;

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}
