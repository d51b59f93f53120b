//! Who an audit entry is attributed to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staffgate_common_core::PrincipalId;

/// Attribution for an entry.
///
/// An impersonated action always names both identities; there is no way to
/// build one without the original administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditActors {
    Direct {
        actor_id: PrincipalId,
    },
    Impersonated {
        actor_id: PrincipalId,
        original_actor_id: PrincipalId,
        started_at: DateTime<Utc>,
    },
}

impl AuditActors {
    pub fn direct(actor_id: PrincipalId) -> Self {
        Self::Direct { actor_id }
    }

    pub fn impersonated(actor_id: PrincipalId, original_actor_id: PrincipalId, started_at: DateTime<Utc>) -> Self {
        Self::Impersonated {
            actor_id,
            original_actor_id,
            started_at,
        }
    }

    /// The effective principal.
    pub fn actor_id(&self) -> PrincipalId {
        match self {
            Self::Direct { actor_id } | Self::Impersonated { actor_id, .. } => *actor_id,
        }
    }

    pub fn original_actor_id(&self) -> Option<PrincipalId> {
        match self {
            Self::Direct { .. } => None,
            Self::Impersonated { original_actor_id, .. } => Some(*original_actor_id),
        }
    }

    pub fn is_impersonated(&self) -> bool {
        matches!(self, Self::Impersonated { .. })
    }
}
