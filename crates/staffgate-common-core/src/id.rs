//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A strongly-typed ID wrapper.
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("A unique identifier with prefix '", $prefix, "_'.")]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from string (with or without prefix).
            pub fn parse(s: &str) -> Result<Self, IdParseError> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| IdParseError::InvalidFormat)
            }

            /// Get the inner UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

/// Error parsing an ID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// The ID format is invalid.
    #[error("invalid ID format")]
    InvalidFormat,
}

define_id!(PrincipalId, "prn");
define_id!(SessionId, "ses");
define_id!(RequestId, "req");

/// Facility identifier.
///
/// Facilities are keyed by the integer primary key of the tenant table, not a UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(i64);

impl FacilityId {
    /// Wrap a raw facility key.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw facility key.
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for FacilityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FacilityId({})", self.0)
    }
}

impl std::str::FromStr for FacilityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| IdParseError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_principal_id_roundtrip() {
        let id = PrincipalId::new();
        let parsed = PrincipalId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_prefixes() {
        assert!(PrincipalId::new().to_string().starts_with("prn_"));
        assert!(SessionId::new().to_string().starts_with("ses_"));
        assert!(RequestId::new().to_string().starts_with("req_"));
    }

    #[test]
    fn test_id_parse_without_prefix() {
        let id = SessionId::new();
        let parsed = SessionId::parse(&id.as_uuid().to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        assert_eq!(RequestId::parse("req_nope"), Err(IdParseError::InvalidFormat));
    }

    #[test]
    fn test_id_serializes_as_bare_uuid() {
        let id = PrincipalId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn test_facility_id_parse() {
        assert_eq!("42".parse::<FacilityId>().unwrap(), FacilityId::new(42));
        assert_eq!(" 7 ".parse::<FacilityId>().unwrap(), FacilityId::new(7));
        assert!("abc".parse::<FacilityId>().is_err());
    }

    proptest! {
        #[test]
        fn test_facility_id_display_parses_back(raw in any::<i64>()) {
            let id = FacilityId::new(raw);
            prop_assert_eq!(id.to_string().parse::<FacilityId>().unwrap(), id);
        }
    }
}
