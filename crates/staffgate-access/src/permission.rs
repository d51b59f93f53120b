//! Permission tokens.

use serde::{Deserialize, Serialize};
use staffgate_common_config::is_valid_permission_token;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// An opaque, dot-namespaced capability token such as `shifts.create`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(Cow<'static, str>);

/// Error parsing a permission token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed permission token '{0}': expected resource.action")]
pub struct PermissionParseError(pub String);

impl Permission {
    /// Build a token from a static string without validation.
    ///
    /// Only for the constants in [`tokens`]; those are checked by tests.
    pub const fn from_static(token: &'static str) -> Self {
        Self(Cow::Borrowed(token))
    }

    /// Parse and validate a token.
    pub fn parse(token: &str) -> Result<Self, PermissionParseError> {
        if is_valid_permission_token(token) {
            Ok(Self(Cow::Owned(token.to_string())))
        } else {
            Err(PermissionParseError(token.to_string()))
        }
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource namespace (everything before the last dot).
    pub fn resource(&self) -> &str {
        self.0.rsplit_once('.').map(|(r, _)| r).unwrap_or(&self.0)
    }

    /// Action (the last segment).
    pub fn action(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, a)| a).unwrap_or(&self.0)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Permission::parse(&token)
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.0.into_owned()
    }
}

impl std::str::FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s)
    }
}

/// Well-known permission tokens.
pub mod tokens {
    use super::Permission;

    pub const FACILITIES_VIEW: Permission = Permission::from_static("facilities.view");
    pub const FACILITIES_CREATE: Permission = Permission::from_static("facilities.create");
    pub const FACILITIES_UPDATE: Permission = Permission::from_static("facilities.update");
    pub const FACILITIES_DELETE: Permission = Permission::from_static("facilities.delete");

    pub const STAFF_VIEW: Permission = Permission::from_static("staff.view");
    pub const STAFF_CREATE: Permission = Permission::from_static("staff.create");
    pub const STAFF_UPDATE: Permission = Permission::from_static("staff.update");
    pub const STAFF_DELETE: Permission = Permission::from_static("staff.delete");

    pub const SHIFTS_VIEW: Permission = Permission::from_static("shifts.view");
    pub const SHIFTS_CREATE: Permission = Permission::from_static("shifts.create");
    pub const SHIFTS_UPDATE: Permission = Permission::from_static("shifts.update");
    pub const SHIFTS_DELETE: Permission = Permission::from_static("shifts.delete");
    pub const SHIFTS_ASSIGN: Permission = Permission::from_static("shifts.assign");
    pub const SHIFTS_CLAIM: Permission = Permission::from_static("shifts.claim");

    pub const TIMESHEETS_VIEW: Permission = Permission::from_static("timesheets.view");
    pub const TIMESHEETS_SUBMIT: Permission = Permission::from_static("timesheets.submit");
    pub const TIMESHEETS_APPROVE: Permission = Permission::from_static("timesheets.approve");

    pub const INVOICES_VIEW: Permission = Permission::from_static("invoices.view");
    pub const INVOICES_CREATE: Permission = Permission::from_static("invoices.create");

    pub const REPORTS_VIEW: Permission = Permission::from_static("reports.view");
    pub const CHAT_ACCESS: Permission = Permission::from_static("chat.access");
    pub const USERS_MANAGE: Permission = Permission::from_static("users.manage");
    pub const AUDIT_VIEW: Permission = Permission::from_static("audit.view");
    pub const ADMIN_IMPERSONATE: Permission = Permission::from_static("admin.impersonate");

    /// Every well-known token.
    pub const ALL: [Permission; 24] = [
        FACILITIES_VIEW,
        FACILITIES_CREATE,
        FACILITIES_UPDATE,
        FACILITIES_DELETE,
        STAFF_VIEW,
        STAFF_CREATE,
        STAFF_UPDATE,
        STAFF_DELETE,
        SHIFTS_VIEW,
        SHIFTS_CREATE,
        SHIFTS_UPDATE,
        SHIFTS_DELETE,
        SHIFTS_ASSIGN,
        SHIFTS_CLAIM,
        TIMESHEETS_VIEW,
        TIMESHEETS_SUBMIT,
        TIMESHEETS_APPROVE,
        INVOICES_VIEW,
        INVOICES_CREATE,
        REPORTS_VIEW,
        CHAT_ACCESS,
        USERS_MANAGE,
        AUDIT_VIEW,
        ADMIN_IMPERSONATE,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_tokens_are_valid() {
        for token in tokens::ALL {
            assert!(
                Permission::parse(token.as_str()).is_ok(),
                "{token} is malformed"
            );
        }
    }

    #[test]
    fn test_static_and_parsed_tokens_compare_equal() {
        assert_eq!(Permission::parse("shifts.create").unwrap(), tokens::SHIFTS_CREATE);
    }

    #[test]
    fn test_resource_and_action() {
        let p = Permission::parse("time_off.requests.approve").unwrap();
        assert_eq!(p.resource(), "time_off.requests");
        assert_eq!(p.action(), "approve");
        assert_eq!(tokens::STAFF_VIEW.resource(), "staff");
        assert_eq!(tokens::STAFF_VIEW.action(), "view");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Permission::parse("shifts").is_err());
        assert!(Permission::parse("").is_err());
        assert!(Permission::parse("shifts.*").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Permission = serde_json::from_str("\"audit.view\"").unwrap();
        assert_eq!(ok, tokens::AUDIT_VIEW);
        assert!(serde_json::from_str::<Permission>("\"audit\"").is_err());
    }
}
