//! Resolve a session into effective and original principals.

use crate::catalog::PermissionCatalog;
use crate::error::AccessError;
use crate::permission::tokens;
use crate::principal::{Principal, PrincipalDirectory, PrincipalRef};
use crate::session::Session;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Principals behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Who the request acts as.
    pub effective: Principal,
    /// The administrator behind an impersonation.
    pub original: Option<Principal>,
    pub impersonation_started_at: Option<DateTime<Utc>>,
}

impl ResolvedIdentity {
    /// A non-impersonating identity.
    pub fn direct(principal: Principal) -> Self {
        Self {
            effective: principal,
            original: None,
            impersonation_started_at: None,
        }
    }

    pub fn is_impersonating(&self) -> bool {
        self.original.is_some()
    }
}

/// Failure to resolve a session.
///
/// Every variant is treated as unauthenticated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("authenticated principal {0:?} is missing or inactive")]
    PrincipalUnavailable(PrincipalRef),

    #[error("impersonation target {0:?} is missing or inactive")]
    ImpersonationTargetUnavailable(PrincipalRef),

    #[error("impersonator {0:?} no longer holds admin.impersonate")]
    ImpersonatorRevoked(PrincipalRef),

    #[error(transparent)]
    Directory(#[from] AccessError),
}

impl IdentityError {
    /// Whether the session's impersonation marker must be dropped.
    pub fn clears_impersonation(&self) -> bool {
        !matches!(self, Self::Directory(_))
    }
}

/// Loads both principals of a session fresh on every call.
#[derive(Clone)]
pub struct SessionIdentity {
    directory: Arc<dyn PrincipalDirectory>,
    catalog: Arc<PermissionCatalog>,
}

impl SessionIdentity {
    pub fn new(directory: Arc<dyn PrincipalDirectory>, catalog: Arc<PermissionCatalog>) -> Self {
        Self { directory, catalog }
    }

    /// Resolve `session`.
    ///
    /// No record is cached across calls, so deactivations and role changes
    /// take effect on the next request.
    pub async fn resolve(&self, session: &Session) -> Result<ResolvedIdentity, IdentityError> {
        let authenticated = self
            .load_active(&session.principal)
            .await?
            .ok_or(IdentityError::PrincipalUnavailable(session.principal))?;

        let Some(marker) = session.impersonation else {
            return Ok(ResolvedIdentity::direct(authenticated));
        };

        if !self
            .catalog
            .role_has_permission(&authenticated.role, &tokens::ADMIN_IMPERSONATE)
        {
            return Err(IdentityError::ImpersonatorRevoked(session.principal));
        }

        let target = self
            .load_active(&marker.target)
            .await?
            .ok_or(IdentityError::ImpersonationTargetUnavailable(marker.target))?;

        debug!(
            actor_id = %target.id,
            original_actor_id = %authenticated.id,
            "resolved impersonated identity"
        );

        Ok(ResolvedIdentity {
            effective: target,
            original: Some(authenticated),
            impersonation_started_at: Some(marker.started_at),
        })
    }

    async fn load_active(&self, reference: &PrincipalRef) -> Result<Option<Principal>, AccessError> {
        Ok(self
            .directory
            .load(reference)
            .await?
            .filter(|p| p.active))
    }
}
