//! Test utilities for StaffGate crates.

use staffgate_access::{InMemoryDirectory, InMemoryFacilityRegistry, Principal, PrincipalKind, Role};
use staffgate_common_core::FacilityId;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    std::fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Facility ids from raw keys.
pub fn facilities(raw: &[i64]) -> Vec<FacilityId> {
    raw.iter().copied().map(FacilityId::new).collect()
}

/// An active user principal with `role` and no facilities.
pub fn principal(role: Role) -> Principal {
    let name = role.to_string();
    Principal::new(PrincipalKind::User, role, name)
}

pub fn super_admin() -> Principal {
    principal(Role::SuperAdmin)
}

/// A principal with `role` associated with `raw` facilities.
pub fn principal_at(role: Role, raw: &[i64]) -> Principal {
    principal(role).with_facilities(facilities(raw))
}

/// A registry containing `raw` facilities.
pub fn facility_registry(raw: &[i64]) -> Arc<InMemoryFacilityRegistry> {
    Arc::new(InMemoryFacilityRegistry::new(facilities(raw)))
}

/// Builder for an in-memory principal directory.
#[derive(Default)]
pub struct DirectoryBuilder {
    principals: Vec<Principal>,
}

impl DirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, principal: &Principal) -> Self {
        self.principals.push(principal.clone());
        self
    }

    pub fn build(self) -> Arc<InMemoryDirectory> {
        let directory = InMemoryDirectory::new();
        for p in self.principals {
            directory.upsert(p);
        }
        Arc::new(directory)
    }
}

/// Macro for async tests with tokio runtime.
#[macro_export]
macro_rules! async_test {
    ($name:ident, $body:expr) => {
        #[tokio::test]
        async fn $name() {
            $body
        }
    };
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use staffgate_access::PrincipalDirectory;

    #[test]
    fn test_temp_file_creation() {
        let (_dir, path) = temp_file("roles: {}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "roles: {}");
    }

    #[test]
    fn test_principal_at() {
        let p = principal_at(Role::Scheduler, &[1, 2]);
        assert_eq!(p.role, Role::Scheduler);
        assert_eq!(p.facility_associations().len(), 2);
        assert!(p.active);
    }

    async_test!(test_directory_builder, {
        let p = super_admin();
        let directory = DirectoryBuilder::new().with(&p).build();
        let loaded = assert_ok!(directory.load(&p.reference()).await);
        assert_eq!(loaded, Some(p));
    });

    #[test]
    fn test_assert_err_returns_error() {
        let err = assert_err!("x".parse::<i32>());
        assert!(!err.to_string().is_empty());
    }

    proptest! {
        #[test]
        fn test_facilities_preserve_keys(raw in prop::collection::vec(any::<i64>(), 0..16)) {
            let ids = facilities(&raw);
            prop_assert_eq!(ids.iter().map(|f| f.get()).collect::<Vec<_>>(), raw);
        }
    }
}
