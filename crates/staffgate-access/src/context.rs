//! Per-request authorization context.

use crate::identity::ResolvedIdentity;
use crate::principal::Principal;
use crate::scope::FacilityScopeResult;
use staffgate_common_core::{FacilityId, RequestId, SessionId};

/// Client details captured at the edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// The one value the pipeline attaches to a request once identity and scope
/// are known. Handlers read it; nothing else is added to the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub request_id: RequestId,
    pub session_id: SessionId,
    pub identity: ResolvedIdentity,
    pub scope: FacilityScopeResult,
    /// Facility named by the route, once validated.
    pub facility_id: Option<FacilityId>,
    pub client: ClientInfo,
}

impl AuthContext {
    pub fn effective(&self) -> &Principal {
        &self.identity.effective
    }

    pub fn original(&self) -> Option<&Principal> {
        self.identity.original.as_ref()
    }

    pub fn is_impersonating(&self) -> bool {
        self.identity.is_impersonating()
    }

    /// Facility ids to stamp on audit entries: the route's facility when
    /// present, otherwise the restricted scope.
    pub fn facility_context_ids(&self) -> Vec<FacilityId> {
        match (self.facility_id, self.scope.facility_ids()) {
            (Some(id), _) => vec![id],
            (None, Some(ids)) => ids.iter().copied().collect(),
            (None, None) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::PrincipalKind;
    use crate::role::Role;

    fn context(scope: FacilityScopeResult, facility_id: Option<FacilityId>) -> AuthContext {
        AuthContext {
            request_id: RequestId::new(),
            session_id: SessionId::new(),
            identity: ResolvedIdentity::direct(Principal::new(PrincipalKind::User, Role::Scheduler, "Sam")),
            scope,
            facility_id,
            client: ClientInfo::default(),
        }
    }

    #[test]
    fn test_facility_context_prefers_route_facility() {
        let scope = FacilityScopeResult::Restricted([FacilityId::new(1), FacilityId::new(2)].into());
        assert_eq!(
            context(scope.clone(), Some(FacilityId::new(2))).facility_context_ids(),
            vec![FacilityId::new(2)]
        );
        assert_eq!(
            context(scope, None).facility_context_ids(),
            vec![FacilityId::new(1), FacilityId::new(2)]
        );
        assert!(context(FacilityScopeResult::Unrestricted, None)
            .facility_context_ids()
            .is_empty());
    }
}
