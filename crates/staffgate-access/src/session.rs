//! Session value and impersonation transitions.
//!
//! A [`Session`] is a plain value. Transitions never mutate in place; they
//! return the next session and leave persistence to the transport.

use crate::catalog::PermissionCatalog;
use crate::identity::ResolvedIdentity;
use crate::permission::tokens;
use crate::principal::{Principal, PrincipalRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staffgate_common_core::SessionId;
use thiserror::Error;

/// Present exactly while an impersonation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationMarker {
    pub target: PrincipalRef,
    pub started_at: DateTime<Utc>,
}

/// Server-side session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// The principal that actually authenticated.
    pub principal: PrincipalRef,
    pub impersonation: Option<ImpersonationMarker>,
}

/// Rejected impersonation start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImpersonationError {
    #[error("an impersonation is already active for this session")]
    AlreadyImpersonating,

    #[error("caller does not hold admin.impersonate")]
    NotPermitted,

    #[error("a principal cannot impersonate themself")]
    SelfTarget,

    #[error("impersonation target does not exist or is inactive")]
    TargetUnavailable,

    #[error("cannot impersonate a principal with greater privileges")]
    Escalation,

    #[error("resolved identity does not belong to this session")]
    SessionMismatch,
}

/// Result of a quit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuitOutcome {
    /// The impersonation ended; `target` is who was being impersonated.
    Ended {
        session: Session,
        target: PrincipalRef,
    },
    /// There was nothing to quit.
    NotImpersonating,
}

impl Session {
    /// A fresh, non-impersonating session.
    pub fn new(principal: PrincipalRef) -> Self {
        Self {
            id: SessionId::new(),
            principal,
            impersonation: None,
        }
    }

    pub fn is_impersonating(&self) -> bool {
        self.impersonation.is_some()
    }

    /// The principal requests act as.
    pub fn effective_principal(&self) -> PrincipalRef {
        self.impersonation
            .map(|m| m.target)
            .unwrap_or(self.principal)
    }

    /// The administrator behind an active impersonation.
    pub fn original_principal(&self) -> Option<PrincipalRef> {
        self.impersonation.map(|_| self.principal)
    }

    pub fn impersonation_started_at(&self) -> Option<DateTime<Utc>> {
        self.impersonation.map(|m| m.started_at)
    }

    /// Begin impersonating `target`.
    ///
    /// `caller` must be this session's resolution from the current request.
    /// On any error the session is unchanged; callers keep using `self`.
    pub fn start_impersonation(
        &self,
        caller: &ResolvedIdentity,
        catalog: &PermissionCatalog,
        target: &Principal,
        now: DateTime<Utc>,
    ) -> Result<Session, ImpersonationError> {
        if self.impersonation.is_some() || caller.is_impersonating() {
            return Err(ImpersonationError::AlreadyImpersonating);
        }
        if caller.effective.reference() != self.principal {
            return Err(ImpersonationError::SessionMismatch);
        }

        let admin = &caller.effective;
        if !catalog.role_has_permission(&admin.role, &tokens::ADMIN_IMPERSONATE) {
            return Err(ImpersonationError::NotPermitted);
        }
        if target.reference() == self.principal {
            return Err(ImpersonationError::SelfTarget);
        }
        if !target.active {
            return Err(ImpersonationError::TargetUnavailable);
        }
        if target.role.is_super_admin_class() && !admin.role.is_super_admin_class() {
            return Err(ImpersonationError::Escalation);
        }

        Ok(Session {
            id: self.id,
            principal: self.principal,
            impersonation: Some(ImpersonationMarker {
                target: target.reference(),
                started_at: now,
            }),
        })
    }

    /// End the active impersonation, if any.
    pub fn quit_impersonation(&self) -> QuitOutcome {
        match self.impersonation {
            Some(marker) => QuitOutcome::Ended {
                session: self.clear_impersonation(),
                target: marker.target,
            },
            None => QuitOutcome::NotImpersonating,
        }
    }

    /// Drop the marker unconditionally. Used when identity resolution fails.
    pub fn clear_impersonation(&self) -> Session {
        Session {
            id: self.id,
            principal: self.principal,
            impersonation: None,
        }
    }
}
