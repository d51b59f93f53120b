//! Access policy file types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role grants as written in the policy file.
///
/// ```yaml
/// roles:
///   scheduler:
///     - shifts.view
///     - shifts.create
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessPolicyConfig {
    /// Role tag to permission tokens.
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
}

impl AccessPolicyConfig {
    /// Tokens granted to a role tag, if the file mentions it.
    pub fn grants_for(&self, role: &str) -> Option<&[String]> {
        self.roles.get(role).map(Vec::as_slice)
    }
}
