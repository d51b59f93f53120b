//! Audit actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::EnumString;

/// What an audited request did.
///
/// Serialized as SCREAMING_SNAKE_CASE (`IMPERSONATE_START`). Route-specific
/// verbs that are not listed are carried in [`AuditAction::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Impersonation
    ImpersonateStart,
    ImpersonateEnd,

    // Resource lifecycle
    Create,
    Update,
    Delete,

    // Workflow
    Assign,
    Claim,
    Submit,
    Approve,

    // Reads that are audited explicitly
    Export,

    #[strum(default)]
    Custom(String),
}

impl AuditAction {
    /// Parse an action tag; unknown tags become `Custom`.
    pub fn parse(tag: &str) -> Self {
        AuditAction::from_str(tag).unwrap_or_else(|_| Self::Custom(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ImpersonateStart => "IMPERSONATE_START",
            Self::ImpersonateEnd => "IMPERSONATE_END",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Assign => "ASSIGN",
            Self::Claim => "CLAIM",
            Self::Submit => "SUBMIT",
            Self::Approve => "APPROVE",
            Self::Export => "EXPORT",
            Self::Custom(tag) => tag,
        }
    }

    /// Whether this action starts or ends an impersonation.
    pub fn is_impersonation_control(&self) -> bool {
        matches!(self, Self::ImpersonateStart | Self::ImpersonateEnd)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AuditAction {
    fn from(tag: String) -> Self {
        AuditAction::parse(&tag)
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        action.as_str().to_string()
    }
}
