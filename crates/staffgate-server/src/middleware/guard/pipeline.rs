//! Declarative stage lists for guarded routes.
//!
//! Routes list the stages they need; [`compose`] checks the list and fixes
//! the order regardless of how it was written:
//! authenticate, resolve identity, facility param, gate, handler, audit.

use super::layer::GuardLayer;
use crate::state::AppState;
use staffgate_access::Permission;
use staffgate_audit_types::AuditAction;
use std::sync::Arc;
use thiserror::Error;

/// One declared requirement of a guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    RequireAuth,
    RequirePermission(Permission),
    RequireFacilityParam(String),
    Audit { action: AuditAction, resource: String },
}

pub fn require_auth() -> Stage {
    Stage::RequireAuth
}

pub fn require_permission(permission: Permission) -> Stage {
    Stage::RequirePermission(permission)
}

/// Path parameter holding the facility the request targets.
pub fn require_facility_param(name: impl Into<String>) -> Stage {
    Stage::RequireFacilityParam(name.into())
}

pub fn audit(action: AuditAction, resource: impl Into<String>) -> Stage {
    Stage::Audit {
        action,
        resource: resource.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("guarded routes must declare require_auth")]
    MissingAuth,

    #[error("stage '{0}' declared more than once")]
    Duplicate(&'static str),

    #[error("a facility parameter needs a permission to check it against")]
    FacilityWithoutPermission,
}

/// What gets audited after the handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSpec {
    pub action: AuditAction,
    pub resource: String,
}

/// A checked stage list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub(crate) permission: Option<Permission>,
    pub(crate) facility_param: Option<String>,
    pub(crate) audit: Option<AuditSpec>,
}

impl Pipeline {
    pub fn permission(&self) -> Option<&Permission> {
        self.permission.as_ref()
    }

    pub fn facility_param(&self) -> Option<&str> {
        self.facility_param.as_deref()
    }

    pub fn audit(&self) -> Option<&AuditSpec> {
        self.audit.as_ref()
    }

    /// Label for the request span.
    pub(crate) fn permission_label(&self) -> &str {
        self.permission.as_ref().map(Permission::as_str).unwrap_or("-")
    }

    /// Bind the pipeline to shared state as a tower layer.
    pub fn layer(self, state: AppState) -> GuardLayer {
        GuardLayer::new(Arc::new(self), state)
    }
}

/// Check a stage list and build its pipeline.
pub fn compose(stages: impl IntoIterator<Item = Stage>) -> Result<Pipeline, PipelineError> {
    let mut authenticated = false;
    let mut pipeline = Pipeline {
        permission: None,
        facility_param: None,
        audit: None,
    };

    for stage in stages {
        match stage {
            Stage::RequireAuth if authenticated => return Err(PipelineError::Duplicate("require_auth")),
            Stage::RequireAuth => authenticated = true,
            Stage::RequirePermission(p) => {
                if pipeline.permission.replace(p).is_some() {
                    return Err(PipelineError::Duplicate("require_permission"));
                }
            }
            Stage::RequireFacilityParam(name) => {
                if pipeline.facility_param.replace(name).is_some() {
                    return Err(PipelineError::Duplicate("require_facility_param"));
                }
            }
            Stage::Audit { action, resource } => {
                if pipeline.audit.replace(AuditSpec { action, resource }).is_some() {
                    return Err(PipelineError::Duplicate("audit"));
                }
            }
        }
    }

    if !authenticated {
        return Err(PipelineError::MissingAuth);
    }
    if pipeline.facility_param.is_some() && pipeline.permission.is_none() {
        return Err(PipelineError::FacilityWithoutPermission);
    }
    Ok(pipeline)
}
