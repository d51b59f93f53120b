//! Configuration types for StaffGate.
//!
//! This crate loads the access policy file (`access-policy.yaml`) that
//! overrides the built-in role to permission grants.

pub mod loader;
pub mod types;

pub use loader::{is_valid_permission_token, load_access_policy, parse_access_policy, ConfigError};
pub use types::AccessPolicyConfig;
