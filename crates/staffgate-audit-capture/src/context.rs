//! Everything the recorder needs to build one entry.

use serde::Serialize;
use staffgate_access::{AuthContext, Permission, ResolvedIdentity};
use staffgate_audit_types::{AuditAction, AuditActors, AuditEntry, AuditError, AuditOutcome};
use staffgate_common_core::{FacilityId, RequestId};
use tracing::warn;

/// Resource snapshots reported by a handler.
///
/// Handlers attach this to their response; the pipeline copies it into the
/// entry after the handler returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditChanges {
    pub resource_id: Option<String>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
}

impl AuditChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_id(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    /// Snapshot before the change. Values that fail to serialize are
    /// logged and skipped.
    pub fn before(mut self, state: &impl Serialize) -> Self {
        self.before = snapshot("before", self.resource_id.as_deref(), state);
        self
    }

    /// Snapshot after the change. Values that fail to serialize are logged
    /// and skipped.
    pub fn after(mut self, state: &impl Serialize) -> Self {
        self.after = snapshot("after", self.resource_id.as_deref(), state);
        self
    }
}

fn snapshot(side: &str, resource_id: Option<&str>, state: &impl Serialize) -> Option<serde_json::Value> {
    match serde_json::to_value(state) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                side,
                resource_id = resource_id.unwrap_or("-"),
                error = %err,
                "audit snapshot could not be serialized"
            );
            None
        }
    }
}

/// Decision context for one gated action.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub action: AuditAction,
    pub resource: String,
    pub permission: Option<Permission>,
    pub actors: AuditActors,
    pub request_id: RequestId,
    pub outcome: AuditOutcome,
    pub changes: AuditChanges,
    pub facility_context_ids: Vec<FacilityId>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    /// Context for an action taken under `auth`.
    ///
    /// Attribution comes from the identity resolved for this request only.
    pub fn from_auth(
        auth: &AuthContext,
        action: AuditAction,
        resource: impl Into<String>,
        permission: Option<Permission>,
    ) -> Result<Self, AuditError> {
        Ok(Self {
            action,
            resource: resource.into(),
            permission,
            actors: actors_for(&auth.identity)?,
            request_id: auth.request_id,
            outcome: AuditOutcome::Success,
            changes: AuditChanges::default(),
            facility_context_ids: auth.facility_context_ids(),
            ip: auth.client.ip.clone(),
            user_agent: auth.client.user_agent.clone(),
        })
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_changes(mut self, changes: AuditChanges) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_actors(mut self, actors: AuditActors) -> Self {
        self.actors = actors;
        self
    }

    /// Build the immutable entry.
    pub fn into_entry(self) -> Result<AuditEntry, AuditError> {
        let mut builder = AuditEntry::builder(self.action, self.resource, self.actors, self.request_id)
            .outcome(self.outcome)
            .facility_context_ids(self.facility_context_ids);

        if let Some(permission) = self.permission {
            builder = builder.permission(permission.as_str());
        }
        if let Some(id) = self.changes.resource_id {
            builder = builder.resource_id(id);
        }
        if let Some(before) = self.changes.before {
            builder = builder.before_state(before);
        }
        if let Some(after) = self.changes.after {
            builder = builder.after_state(after);
        }
        if let Some(ip) = self.ip {
            builder = builder.ip(ip);
        }
        if let Some(ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }

        builder.build()
    }
}

/// Attribution for a resolved identity.
pub fn actors_for(identity: &ResolvedIdentity) -> Result<AuditActors, AuditError> {
    match (&identity.original, identity.impersonation_started_at) {
        (None, _) => Ok(AuditActors::direct(identity.effective.id)),
        (Some(original), Some(started_at)) => Ok(AuditActors::impersonated(
            identity.effective.id,
            original.id,
            started_at,
        )),
        (Some(_), None) => Err(AuditError::InvalidEntry(
            "impersonated identity without a start time".into(),
        )),
    }
}
