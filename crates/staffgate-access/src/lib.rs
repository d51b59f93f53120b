//! Access control for StaffGate.
//!
//! This crate provides:
//! - The role to permission catalog
//! - Session values with impersonation transitions
//! - Identity resolution against a principal directory
//! - Facility scoping and the access gate

pub mod catalog;
pub mod context;
pub mod error;
pub mod gate;
pub mod identity;
pub mod permission;
pub mod principal;
pub mod role;
pub mod scope;
pub mod session;

pub use catalog::{CatalogError, PermissionCatalog, RoleGrants};
pub use context::{AuthContext, ClientInfo};
pub use error::AccessError;
pub use gate::{AccessGate, Decision, DenyReason};
pub use identity::{IdentityError, ResolvedIdentity, SessionIdentity};
pub use permission::{tokens, Permission, PermissionParseError};
pub use principal::{InMemoryDirectory, Principal, PrincipalDirectory, PrincipalKind, PrincipalRef};
pub use role::{Role, SUPER_ADMIN_CLASS};
pub use scope::{filter_by_scope, FacilityRegistry, FacilityScope, FacilityScopeResult, InMemoryFacilityRegistry};
pub use session::{ImpersonationError, ImpersonationMarker, QuitOutcome, Session};
