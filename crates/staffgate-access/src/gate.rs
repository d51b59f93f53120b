//! Allow/deny decisions.

use crate::catalog::PermissionCatalog;
use crate::permission::Permission;
use crate::principal::Principal;
use crate::scope::FacilityScopeResult;
use serde::Serialize;
use staffgate_common_core::FacilityId;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Why a request was denied. Internal only; clients see a uniform 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    MissingPermission,
    FacilityOutOfScope,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingPermission => "missing_permission",
            Self::FacilityOutOfScope => "facility_out_of_scope",
        })
    }
}

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Composes the catalog and a computed facility scope.
#[derive(Debug, Clone)]
pub struct AccessGate {
    catalog: Arc<PermissionCatalog>,
}

impl AccessGate {
    pub fn new(catalog: Arc<PermissionCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<PermissionCatalog> {
        &self.catalog
    }

    /// Decide whether `principal` may use `permission`, optionally on
    /// `facility`.
    ///
    /// The permission check always runs first. `scope` must be the scope
    /// computed for the same principal.
    pub fn authorize(
        &self,
        principal: &Principal,
        scope: &FacilityScopeResult,
        permission: &Permission,
        facility: Option<FacilityId>,
    ) -> Decision {
        if !principal.role.is_recognized() {
            warn!(
                user_id = %principal.id,
                role = %principal.role,
                "unrecognized role resolved as viewer"
            );
        }

        if !self.catalog.role_has_permission(&principal.role, permission) {
            return Decision::Deny(DenyReason::MissingPermission);
        }

        match facility {
            Some(id) if !scope.is_allowed(id) => Decision::Deny(DenyReason::FacilityOutOfScope),
            _ => Decision::Allow,
        }
    }
}
