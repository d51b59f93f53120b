//! Principal roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::EnumString;

/// The single role held by a principal.
///
/// Tags that do not name a known role are kept verbatim in
/// [`Role::Unrecognized`] so the anomaly stays visible in logs; the catalog
/// resolves them as [`Role::Viewer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    SuperAdmin,
    PlatformAdmin,
    FacilityAdmin,
    FacilityManager,
    Scheduler,
    Employee,
    Contractor,
    Viewer,
    #[strum(default)]
    Unrecognized(String),
}

/// Roles that bypass both the permission catalog and facility scoping.
///
/// Fixed in code; configuration cannot widen or narrow it.
pub const SUPER_ADMIN_CLASS: [Role; 2] = [Role::SuperAdmin, Role::PlatformAdmin];

impl Role {
    /// Every known role, most privileged first.
    pub const KNOWN: [Role; 8] = [
        Role::SuperAdmin,
        Role::PlatformAdmin,
        Role::FacilityAdmin,
        Role::FacilityManager,
        Role::Scheduler,
        Role::Employee,
        Role::Contractor,
        Role::Viewer,
    ];

    /// Parse a role tag. Never fails; unknown tags become `Unrecognized`.
    pub fn parse(tag: &str) -> Self {
        match Role::from_str(tag.trim()) {
            Ok(role) => role,
            Err(_) => Role::Unrecognized(tag.to_string()),
        }
    }

    /// Canonical tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::PlatformAdmin => "platform_admin",
            Self::FacilityAdmin => "facility_admin",
            Self::FacilityManager => "facility_manager",
            Self::Scheduler => "scheduler",
            Self::Employee => "employee",
            Self::Contractor => "contractor",
            Self::Viewer => "viewer",
            Self::Unrecognized(tag) => tag,
        }
    }

    /// Whether this role belongs to [`SUPER_ADMIN_CLASS`].
    pub fn is_super_admin_class(&self) -> bool {
        SUPER_ADMIN_CLASS.contains(self)
    }

    /// Whether the tag named a known role.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(tag: String) -> Self {
        Role::parse(&tag)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("super_admin", Role::SuperAdmin)]
    #[test_case("platform_admin", Role::PlatformAdmin)]
    #[test_case("facility_admin", Role::FacilityAdmin)]
    #[test_case("Scheduler", Role::Scheduler)]
    #[test_case(" viewer ", Role::Viewer)]
    fn test_parse_known(tag: &str, expected: Role) {
        assert_eq!(Role::parse(tag), expected);
    }

    #[test]
    fn test_parse_unknown_keeps_tag() {
        assert_eq!(
            Role::parse("night_owl"),
            Role::Unrecognized("night_owl".to_string())
        );
        assert!(!Role::parse("night_owl").is_recognized());
    }

    #[test]
    fn test_tag_roundtrip_for_known_roles() {
        for role in Role::KNOWN {
            assert_eq!(Role::parse(role.as_str()), role);
        }
    }

    #[test]
    fn test_super_admin_class_is_fixed() {
        assert!(Role::SuperAdmin.is_super_admin_class());
        assert!(Role::PlatformAdmin.is_super_admin_class());
        assert!(!Role::FacilityAdmin.is_super_admin_class());
        assert!(!Role::Unrecognized("super_admin2".into()).is_super_admin_class());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&Role::FacilityManager).unwrap();
        assert_eq!(json, "\"facility_manager\"");
        let back: Role = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(back, Role::Unrecognized("mystery".to_string()));
    }
}
