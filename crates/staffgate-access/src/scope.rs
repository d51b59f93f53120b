//! Facility scoping.

use crate::error::AccessError;
use crate::principal::Principal;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use staffgate_common_core::FacilityId;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// Facilities a principal may touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "facilities", rename_all = "snake_case")]
pub enum FacilityScopeResult {
    Unrestricted,
    Restricted(BTreeSet<FacilityId>),
}

impl FacilityScopeResult {
    /// Whether `facility` is inside the scope.
    ///
    /// An empty restricted scope allows nothing.
    pub fn is_allowed(&self, facility: FacilityId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Restricted(ids) => ids.contains(&facility),
        }
    }

    /// Facility ids for audit context. `None` for unrestricted scopes.
    pub fn facility_ids(&self) -> Option<&BTreeSet<FacilityId>> {
        match self {
            Self::Unrestricted => None,
            Self::Restricted(ids) => Some(ids),
        }
    }
}

/// Source of truth for which facility ids exist.
#[async_trait]
pub trait FacilityRegistry: Send + Sync {
    async fn exists(&self, facility: FacilityId) -> Result<bool, AccessError>;
}

/// Registry held in memory, refreshed out of band.
#[derive(Debug, Default)]
pub struct InMemoryFacilityRegistry {
    facilities: RwLock<BTreeSet<FacilityId>>,
}

impl InMemoryFacilityRegistry {
    pub fn new(facilities: impl IntoIterator<Item = FacilityId>) -> Self {
        Self {
            facilities: RwLock::new(facilities.into_iter().collect()),
        }
    }

    /// Replace the known set.
    pub fn refresh(&self, facilities: impl IntoIterator<Item = FacilityId>) {
        *self.facilities.write() = facilities.into_iter().collect();
    }

    pub fn all(&self) -> BTreeSet<FacilityId> {
        self.facilities.read().clone()
    }
}

#[async_trait]
impl FacilityRegistry for InMemoryFacilityRegistry {
    async fn exists(&self, facility: FacilityId) -> Result<bool, AccessError> {
        Ok(self.facilities.read().contains(&facility))
    }
}

/// Computes scopes against a registry.
#[derive(Clone)]
pub struct FacilityScope {
    registry: Arc<dyn FacilityRegistry>,
}

impl FacilityScope {
    pub fn new(registry: Arc<dyn FacilityRegistry>) -> Self {
        Self { registry }
    }

    /// Scope for `principal`.
    ///
    /// Registry failures propagate; a scope is never widened or guessed
    /// when existence cannot be checked.
    pub async fn scope_for(&self, principal: &Principal) -> Result<FacilityScopeResult, AccessError> {
        if principal.role.is_super_admin_class() {
            return Ok(FacilityScopeResult::Unrestricted);
        }

        let mut allowed = BTreeSet::new();
        for facility in principal.facility_associations() {
            if self.registry.exists(facility).await? {
                allowed.insert(facility);
            } else {
                warn!(
                    user_id = %principal.id,
                    facility_id = %facility,
                    "dropping association with non-existent facility"
                );
            }
        }

        Ok(FacilityScopeResult::Restricted(allowed))
    }
}

/// Keep the items whose facility is inside `scope`.
///
/// Items with no facility are only visible to unrestricted scopes.
pub fn filter_by_scope<T, F>(items: impl IntoIterator<Item = T>, scope: &FacilityScopeResult, facility_id_of: F) -> Vec<T>
where
    F: Fn(&T) -> Option<FacilityId>,
{
    items
        .into_iter()
        .filter(|item| match (scope, facility_id_of(item)) {
            (FacilityScopeResult::Unrestricted, _) => true,
            (FacilityScopeResult::Restricted(ids), Some(id)) => ids.contains(&id),
            (FacilityScopeResult::Restricted(_), None) => false,
        })
        .collect()
}
