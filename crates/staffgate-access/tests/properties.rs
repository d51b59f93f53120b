//! Property tests for scoping, gating and impersonation transitions.

use chrono::Utc;
use proptest::prelude::*;
use staffgate_access::{
    tokens, AccessGate, Decision, DenyReason, FacilityScope, FacilityScopeResult, ImpersonationError,
    InMemoryFacilityRegistry, Permission, PermissionCatalog, Principal, PrincipalKind, ResolvedIdentity,
    Role, Session, SUPER_ADMIN_CLASS,
};
use staffgate_common_core::FacilityId;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

fn restricted_role() -> impl Strategy<Value = Role> {
    prop::sample::select(
        Role::KNOWN
            .iter()
            .filter(|r| !r.is_super_admin_class())
            .cloned()
            .collect::<Vec<_>>(),
    )
}

fn any_permission() -> impl Strategy<Value = Permission> {
    prop_oneof![
        prop::sample::select(tokens::ALL.to_vec()),
        "[a-z][a-z0-9_]{0,8}\\.[a-z][a-z0-9_]{0,8}".prop_map(|t| Permission::parse(&t).unwrap()),
    ]
}

fn scope_for(principal: &Principal, existing: impl IntoIterator<Item = FacilityId>) -> FacilityScopeResult {
    let scope = FacilityScope::new(Arc::new(InMemoryFacilityRegistry::new(existing)));
    runtime().block_on(scope.scope_for(principal)).unwrap()
}

proptest! {
    #[test]
    fn test_restricted_principal_without_facilities_is_always_denied(
        role in restricted_role(),
        permission in any_permission(),
        facility in any::<i64>(),
        existing in prop::collection::btree_set(any::<i64>(), 0..8),
    ) {
        let principal = Principal::new(PrincipalKind::User, role, "p");
        let scope = scope_for(&principal, existing.into_iter().map(FacilityId::new));
        let gate = AccessGate::new(Arc::new(PermissionCatalog::builtin()));

        let decision = gate.authorize(&principal, &scope, &permission, Some(FacilityId::new(facility)));
        prop_assert!(!decision.is_allowed());
    }

    #[test]
    fn test_super_admin_class_is_always_allowed(
        role in prop::sample::select(SUPER_ADMIN_CLASS.to_vec()),
        permission in any_permission(),
        facility in prop::option::of(any::<i64>()),
    ) {
        let principal = Principal::new(PrincipalKind::User, role, "root");
        let scope = scope_for(&principal, []);
        let gate = AccessGate::new(Arc::new(PermissionCatalog::builtin()));

        let decision = gate.authorize(&principal, &scope, &permission, facility.map(FacilityId::new));
        prop_assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_missing_permission_reported_before_scope(
        role in restricted_role(),
        permission in any_permission(),
        facility in 1i64..50,
        in_scope in any::<bool>(),
    ) {
        let catalog = PermissionCatalog::builtin();
        let principal = Principal::new(PrincipalKind::User, role.clone(), "p")
            .with_primary_facility(FacilityId::new(if in_scope { facility } else { facility + 100 }));
        let scope = scope_for(&principal, (1..200).map(FacilityId::new));
        let gate = AccessGate::new(Arc::new(catalog.clone()));

        let decision = gate.authorize(&principal, &scope, &permission, Some(FacilityId::new(facility)));
        let expected = match (catalog.role_has_permission(&role, &permission), in_scope) {
            (false, _) => Decision::Deny(DenyReason::MissingPermission),
            (true, false) => Decision::Deny(DenyReason::FacilityOutOfScope),
            (true, true) => Decision::Allow,
        };
        prop_assert_eq!(decision, expected);
    }

    #[test]
    fn test_nested_impersonation_rejected_and_session_unchanged(
        target_role in restricted_role(),
        second_role in restricted_role(),
    ) {
        let catalog = PermissionCatalog::builtin();
        let admin = Principal::new(PrincipalKind::User, Role::SuperAdmin, "root");
        let first = Principal::new(PrincipalKind::User, target_role, "first");
        let second = Principal::new(PrincipalKind::Employee, second_role, "second");

        let session = Session::new(admin.reference())
            .start_impersonation(&ResolvedIdentity::direct(admin.clone()), &catalog, &first, Utc::now())
            .unwrap();
        let before = session.clone();

        let caller = ResolvedIdentity {
            effective: first.clone(),
            original: Some(admin.clone()),
            impersonation_started_at: session.impersonation_started_at(),
        };
        let result = session.start_impersonation(&caller, &catalog, &second, Utc::now());

        prop_assert_eq!(result, Err(ImpersonationError::AlreadyImpersonating));
        prop_assert_eq!(session, before);
    }
}

#[tokio::test]
async fn test_scheduler_denied_on_unassociated_facility() {
    let principal = Principal::new(PrincipalKind::User, Role::Scheduler, "Sam")
        .with_facilities([FacilityId::new(1), FacilityId::new(2)]);
    let registry = Arc::new(InMemoryFacilityRegistry::new((1..=5).map(FacilityId::new)));
    let scope = FacilityScope::new(registry).scope_for(&principal).await.unwrap();
    let gate = AccessGate::new(Arc::new(PermissionCatalog::builtin()));

    assert_eq!(
        gate.authorize(&principal, &scope, &tokens::SHIFTS_CREATE, Some(FacilityId::new(3))),
        Decision::Deny(DenyReason::FacilityOutOfScope)
    );
}

#[tokio::test]
async fn test_viewer_denied_shift_creation() {
    let principal = Principal::new(PrincipalKind::User, Role::Viewer, "Vi").with_facilities([FacilityId::new(1)]);
    let registry = Arc::new(InMemoryFacilityRegistry::new([FacilityId::new(1)]));
    let scope = FacilityScope::new(registry).scope_for(&principal).await.unwrap();
    let gate = AccessGate::new(Arc::new(PermissionCatalog::builtin()));

    assert_eq!(
        gate.authorize(&principal, &scope, &tokens::SHIFTS_CREATE, None),
        Decision::Deny(DenyReason::MissingPermission)
    );
}
