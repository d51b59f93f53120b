//! Sample data for local runs.

use crate::facility::{Facility, FacilityStore};
use crate::middleware::{SessionClaims, TokenDecoder};
use crate::session::InMemorySessionStore;
use staffgate_access::{InMemoryDirectory, Principal, PrincipalKind, Role};
use staffgate_common_core::{FacilityId, SessionId};
use tracing::info;

/// A seeded principal with an open session.
#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub principal: Principal,
    pub session_id: SessionId,
    pub token: String,
}

/// Seed facilities, principals and one session per principal.
pub fn seed(
    directory: &InMemoryDirectory,
    facilities: &FacilityStore,
    sessions: &InMemorySessionStore,
    tokens: &TokenDecoder,
    token_ttl_secs: i64,
) -> Result<Vec<DemoAccount>, jsonwebtoken::errors::Error> {
    for facility in [
        Facility::new(1, "North General"),
        Facility::new(2, "Riverside Care"),
        Facility::new(3, "Eastgate Clinic"),
    ] {
        facilities.insert(facility);
    }

    let principals = [
        Principal::new(PrincipalKind::User, Role::SuperAdmin, "Ada Super"),
        Principal::new(PrincipalKind::User, Role::FacilityAdmin, "Fay Admin").with_primary_facility(FacilityId::new(1)),
        Principal::new(PrincipalKind::User, Role::Scheduler, "Sam Scheduler")
            .with_facilities([FacilityId::new(1), FacilityId::new(2)]),
        Principal::new(PrincipalKind::Employee, Role::Employee, "Eve Employee").with_primary_facility(FacilityId::new(2)),
    ];

    let mut accounts = Vec::with_capacity(principals.len());
    for principal in principals {
        directory.upsert(principal.clone());
        let session = sessions.open(principal.reference());
        let token = tokens.encode(&SessionClaims::new(principal.id, session.id, token_ttl_secs))?;

        info!(
            principal_id = %principal.id,
            role = %principal.role,
            session_id = %session.id,
            token = %token,
            "demo session opened"
        );

        accounts.push(DemoAccount {
            principal,
            session_id: session.id,
            token,
        });
    }

    Ok(accounts)
}
