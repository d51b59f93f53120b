//! Principals and the directory they are loaded from.

use crate::error::AccessError;
use crate::role::Role;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use staffgate_common_core::{FacilityId, PrincipalId};
use std::collections::{BTreeSet, HashMap};
use strum::{Display, EnumString};

/// Which account table a principal lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PrincipalKind {
    /// Platform or facility staff user.
    User,
    /// Facility employee.
    Employee,
    /// External contractor.
    Contractor,
}

/// A typed reference to a principal, as stored in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub id: PrincipalId,
    pub kind: PrincipalKind,
}

impl PrincipalRef {
    pub fn new(id: PrincipalId, kind: PrincipalKind) -> Self {
        Self { id, kind }
    }
}

/// An authenticated identity with a role and facility associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub kind: PrincipalKind,
    pub role: Role,
    pub display_name: String,
    pub primary_facility_id: Option<FacilityId>,
    #[serde(default)]
    pub associated_facility_ids: BTreeSet<FacilityId>,
    pub active: bool,
}

impl Principal {
    /// Create an active principal with no facility associations.
    pub fn new(kind: PrincipalKind, role: Role, display_name: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(),
            kind,
            role,
            display_name: display_name.into(),
            primary_facility_id: None,
            associated_facility_ids: BTreeSet::new(),
            active: true,
        }
    }

    /// Set the primary facility.
    pub fn with_primary_facility(mut self, facility: FacilityId) -> Self {
        self.primary_facility_id = Some(facility);
        self
    }

    /// Add associated facilities.
    pub fn with_facilities(mut self, facilities: impl IntoIterator<Item = FacilityId>) -> Self {
        self.associated_facility_ids.extend(facilities);
        self
    }

    /// Mark as deactivated.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Reference used by sessions.
    pub fn reference(&self) -> PrincipalRef {
        PrincipalRef::new(self.id, self.kind)
    }

    /// `associated_facility_ids ∪ {primary_facility_id}`, before any
    /// existence check.
    pub fn facility_associations(&self) -> BTreeSet<FacilityId> {
        let mut all = self.associated_facility_ids.clone();
        all.extend(self.primary_facility_id);
        all
    }
}

/// Source of current principal records.
///
/// Implementations must return the record as it is now, never a snapshot
/// taken when the session began.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Load a principal. `Ok(None)` when no such principal exists.
    async fn load(&self, reference: &PrincipalRef) -> Result<Option<Principal>, AccessError>;
}

/// Directory held in memory; used by tests and the demo server.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    principals: RwLock<HashMap<PrincipalId, Principal>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal.
    pub fn upsert(&self, principal: Principal) {
        self.principals.write().insert(principal.id, principal);
    }

    /// Deactivate a principal. Returns false if unknown.
    pub fn deactivate(&self, id: PrincipalId) -> bool {
        match self.principals.write().get_mut(&id) {
            Some(p) => {
                p.active = false;
                true
            }
            None => false,
        }
    }

    /// Change a principal's role. Returns false if unknown.
    pub fn set_role(&self, id: PrincipalId, role: Role) -> bool {
        match self.principals.write().get_mut(&id) {
            Some(p) => {
                p.role = role;
                true
            }
            None => false,
        }
    }

    /// Remove a principal entirely.
    pub fn remove(&self, id: PrincipalId) -> Option<Principal> {
        self.principals.write().remove(&id)
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryDirectory {
    async fn load(&self, reference: &PrincipalRef) -> Result<Option<Principal>, AccessError> {
        Ok(self
            .principals
            .read()
            .get(&reference.id)
            .filter(|p| p.kind == reference.kind)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_associations_include_primary() {
        let p = Principal::new(PrincipalKind::User, Role::Scheduler, "Sam")
            .with_primary_facility(FacilityId::new(9))
            .with_facilities([FacilityId::new(1), FacilityId::new(2)]);

        let all: Vec<i64> = p.facility_associations().iter().map(|f| f.get()).collect();
        assert_eq!(all, vec![1, 2, 9]);
    }

    #[test]
    fn test_kind_parses_from_snake_case() {
        assert_eq!("employee".parse::<PrincipalKind>().unwrap(), PrincipalKind::Employee);
        assert!("robot".parse::<PrincipalKind>().is_err());
    }

    #[tokio::test]
    async fn test_directory_returns_current_record() {
        let directory = InMemoryDirectory::new();
        let p = Principal::new(PrincipalKind::User, Role::Scheduler, "Sam");
        let reference = p.reference();
        directory.upsert(p);

        assert!(directory.set_role(reference.id, Role::Viewer));
        let loaded = directory.load(&reference).await.unwrap().unwrap();
        assert_eq!(loaded.role, Role::Viewer);

        assert!(directory.deactivate(reference.id));
        assert!(!directory.load(&reference).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_directory_checks_kind() {
        let directory = InMemoryDirectory::new();
        let p = Principal::new(PrincipalKind::Employee, Role::Employee, "Eve");
        let wrong_kind = PrincipalRef::new(p.id, PrincipalKind::User);
        directory.upsert(p);

        assert!(directory.load(&wrong_kind).await.unwrap().is_none());
    }
}
