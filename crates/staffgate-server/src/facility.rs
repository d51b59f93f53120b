//! Facility records served by the demo routes.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use staffgate_access::{AccessError, FacilityRegistry};
use staffgate_common_core::FacilityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub active: bool,
}

impl Facility {
    pub fn new(id: impl Into<FacilityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            active: true,
        }
    }
}

/// Partial update applied by `PUT /facilities/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacilityPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub active: Option<bool>,
}

impl FacilityPatch {
    pub fn apply(&self, facility: &mut Facility) {
        if let Some(name) = &self.name {
            facility.name = name.clone();
        }
        if let Some(address) = &self.address {
            facility.address = Some(address.clone());
        }
        if let Some(active) = self.active {
            facility.active = active;
        }
    }
}

/// Facility records. Also answers existence checks for scoping.
#[derive(Default)]
pub struct FacilityStore {
    facilities: DashMap<FacilityId, Facility>,
}

impl FacilityStore {
    pub fn new(facilities: impl IntoIterator<Item = Facility>) -> Self {
        Self {
            facilities: facilities.into_iter().map(|f| (f.id, f)).collect(),
        }
    }

    pub fn insert(&self, facility: Facility) {
        self.facilities.insert(facility.id, facility);
    }

    pub fn remove(&self, id: FacilityId) -> Option<Facility> {
        self.facilities.remove(&id).map(|(_, f)| f)
    }

    pub fn get(&self, id: FacilityId) -> Option<Facility> {
        self.facilities.get(&id).map(|f| f.clone())
    }

    /// All facilities ordered by id.
    pub fn list(&self) -> Vec<Facility> {
        let mut all: Vec<Facility> = self.facilities.iter().map(|f| f.clone()).collect();
        all.sort_by_key(|f| f.id);
        all
    }

    /// Apply `patch`, returning the record before and after.
    pub fn update(&self, id: FacilityId, patch: &FacilityPatch) -> Option<(Facility, Facility)> {
        let mut entry = self.facilities.get_mut(&id)?;
        let before = entry.clone();
        patch.apply(&mut entry);
        Some((before, entry.clone()))
    }
}

#[async_trait]
impl FacilityRegistry for FacilityStore {
    async fn exists(&self, id: FacilityId) -> Result<bool, AccessError> {
        Ok(self.facilities.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_returns_before_and_after() {
        let store = FacilityStore::new([Facility::new(1, "North"), Facility::new(2, "South")]);
        let patch = FacilityPatch {
            name: Some("North Wing".into()),
            active: Some(false),
            ..Default::default()
        };

        let (before, after) = store.update(FacilityId::new(1), &patch).unwrap();
        assert_eq!(before.name, "North");
        assert_eq!(after.name, "North Wing");
        assert!(!after.active);
        assert_eq!(store.get(FacilityId::new(1)), Some(after));
        assert!(store.update(FacilityId::new(9), &patch).is_none());
    }

    #[tokio::test]
    async fn test_registry_tracks_records() {
        let store = FacilityStore::new([Facility::new(3, "East")]);
        assert!(store.exists(FacilityId::new(3)).await.unwrap());

        store.remove(FacilityId::new(3));
        assert!(!store.exists(FacilityId::new(3)).await.unwrap());
        assert!(store.list().is_empty());
    }
}
