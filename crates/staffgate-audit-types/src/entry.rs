//! The audit entry.

use crate::{AuditAction, AuditActors, AuditEntryId, AuditError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staffgate_common_core::{FacilityId, PrincipalId, RequestId};

/// An immutable record of one gated action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditEntryId,
    /// Effective principal.
    pub actor_id: PrincipalId,
    /// Administrator behind an impersonation; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_actor_id: Option<PrincipalId>,
    pub is_impersonated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impersonation_started_at: Option<DateTime<Utc>>,
    pub action: AuditAction,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Token that gated the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    pub outcome: AuditOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_state: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_state: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_context_ids: Option<Vec<FacilityId>>,
    pub timestamp: DateTime<Utc>,
    /// Deduplication key.
    pub request_id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Result of the audited action as the client saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure { status: u16 },
}

impl AuditOutcome {
    /// Outcome for an HTTP status: 2xx and 3xx succeed.
    pub fn from_status(status: u16) -> Self {
        if (200..400).contains(&status) {
            Self::Success
        } else {
            Self::Failure { status }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl AuditEntry {
    /// Start building an entry.
    pub fn builder(
        action: AuditAction,
        resource: impl Into<String>,
        actors: AuditActors,
        request_id: RequestId,
    ) -> AuditEntryBuilder {
        AuditEntryBuilder::new(action, resource, actors, request_id)
    }

    /// Attribution recovered from the stored fields.
    pub fn actors(&self) -> Result<AuditActors, AuditError> {
        self.validate()?;
        Ok(match (self.original_actor_id, self.impersonation_started_at) {
            (Some(original), Some(started_at)) => AuditActors::impersonated(self.actor_id, original, started_at),
            _ => AuditActors::direct(self.actor_id),
        })
    }

    /// Check the impersonation fields agree with each other.
    ///
    /// `is_impersonated` holds exactly when `original_actor_id` is present and
    /// differs from `actor_id`.
    pub fn validate(&self) -> Result<(), AuditError> {
        match (self.is_impersonated, self.original_actor_id) {
            (true, Some(original)) if original != self.actor_id => {}
            (true, Some(_)) => {
                return Err(AuditError::InvalidEntry(
                    "original actor equals actor on an impersonated entry".into(),
                ))
            }
            (true, None) => {
                return Err(AuditError::InvalidEntry(
                    "impersonated entry without original actor".into(),
                ))
            }
            (false, Some(_)) => {
                return Err(AuditError::InvalidEntry(
                    "original actor present on a direct entry".into(),
                ))
            }
            (false, None) => {}
        }

        if self.is_impersonated != self.impersonation_started_at.is_some() {
            return Err(AuditError::InvalidEntry(
                "impersonation start time must accompany impersonated entries only".into(),
            ));
        }

        if self.resource.trim().is_empty() {
            return Err(AuditError::InvalidEntry("resource must not be empty".into()));
        }

        Ok(())
    }
}

/// Builder for [`AuditEntry`].
#[derive(Debug)]
pub struct AuditEntryBuilder {
    action: AuditAction,
    resource: String,
    actors: AuditActors,
    request_id: RequestId,
    resource_id: Option<String>,
    permission: Option<String>,
    outcome: AuditOutcome,
    before_state: Option<serde_json::Value>,
    after_state: Option<serde_json::Value>,
    facility_context_ids: Option<Vec<FacilityId>>,
    timestamp: Option<DateTime<Utc>>,
    ip: Option<String>,
    user_agent: Option<String>,
}

impl AuditEntryBuilder {
    pub fn new(action: AuditAction, resource: impl Into<String>, actors: AuditActors, request_id: RequestId) -> Self {
        Self {
            action,
            resource: resource.into(),
            actors,
            request_id,
            resource_id: None,
            permission: None,
            outcome: AuditOutcome::Success,
            before_state: None,
            after_state: None,
            facility_context_ids: None,
            timestamp: None,
            ip: None,
            user_agent: None,
        }
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn permission(mut self, token: impl Into<String>) -> Self {
        self.permission = Some(token.into());
        self
    }

    pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn before_state(mut self, state: serde_json::Value) -> Self {
        self.before_state = Some(state);
        self
    }

    pub fn after_state(mut self, state: serde_json::Value) -> Self {
        self.after_state = Some(state);
        self
    }

    /// Facilities the action touched. An empty list is stored as absent.
    pub fn facility_context_ids(mut self, ids: impl IntoIterator<Item = FacilityId>) -> Self {
        let ids: Vec<_> = ids.into_iter().collect();
        self.facility_context_ids = (!ids.is_empty()).then_some(ids);
        self
    }

    /// Override the timestamp (defaults to now).
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Build and validate the entry.
    pub fn build(self) -> Result<AuditEntry, AuditError> {
        let entry = AuditEntry {
            id: AuditEntryId::new(),
            actor_id: self.actors.actor_id(),
            original_actor_id: self.actors.original_actor_id(),
            is_impersonated: self.actors.is_impersonated(),
            impersonation_started_at: match self.actors {
                AuditActors::Impersonated { started_at, .. } => Some(started_at),
                AuditActors::Direct { .. } => None,
            },
            action: self.action,
            resource: self.resource,
            resource_id: self.resource_id,
            permission: self.permission,
            outcome: self.outcome,
            before_state: self.before_state,
            after_state: self.after_state,
            facility_context_ids: self.facility_context_ids,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            request_id: self.request_id,
            ip: self.ip,
            user_agent: self.user_agent,
        };

        entry.validate()?;
        Ok(entry)
    }
}
