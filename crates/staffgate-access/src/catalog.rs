//! Role to permission catalog.

use crate::permission::{tokens, Permission, PermissionParseError};
use crate::role::Role;
use staffgate_common_config::AccessPolicyConfig;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

static NO_GRANTS: BTreeSet<Permission> = BTreeSet::new();
static FALLBACK_ROLE: Role = Role::Viewer;

/// Errors building a catalog from a policy file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("role '{0}' is super-admin class and cannot carry explicit grants")]
    SuperAdminGrant(String),

    #[error("policy names unknown role '{0}'")]
    UnrecognizedRole(String),

    #[error(transparent)]
    InvalidToken(#[from] PermissionParseError),
}

/// What a role is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGrants<'a> {
    /// Every token, present and future.
    Universal,
    /// Exactly the listed tokens.
    Tokens(&'a BTreeSet<Permission>),
}

impl RoleGrants<'_> {
    /// Whether the grant covers `permission`.
    pub fn contains(&self, permission: &Permission) -> bool {
        match self {
            Self::Universal => true,
            Self::Tokens(set) => set.contains(permission),
        }
    }
}

/// Immutable role to permission mapping, built once at startup and shared
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    grants: HashMap<Role, BTreeSet<Permission>>,
}

impl PermissionCatalog {
    /// The built-in grants.
    pub fn builtin() -> Self {
        use tokens::*;

        let mut grants = HashMap::new();
        grants.insert(
            Role::FacilityAdmin,
            BTreeSet::from([
                FACILITIES_VIEW,
                FACILITIES_UPDATE,
                STAFF_VIEW,
                STAFF_CREATE,
                STAFF_UPDATE,
                STAFF_DELETE,
                SHIFTS_VIEW,
                SHIFTS_CREATE,
                SHIFTS_UPDATE,
                SHIFTS_DELETE,
                SHIFTS_ASSIGN,
                TIMESHEETS_VIEW,
                TIMESHEETS_APPROVE,
                INVOICES_VIEW,
                REPORTS_VIEW,
                CHAT_ACCESS,
                USERS_MANAGE,
            ]),
        );
        grants.insert(
            Role::FacilityManager,
            BTreeSet::from([
                FACILITIES_VIEW,
                STAFF_VIEW,
                STAFF_CREATE,
                STAFF_UPDATE,
                SHIFTS_VIEW,
                SHIFTS_CREATE,
                SHIFTS_UPDATE,
                SHIFTS_ASSIGN,
                TIMESHEETS_VIEW,
                TIMESHEETS_APPROVE,
                REPORTS_VIEW,
                CHAT_ACCESS,
            ]),
        );
        grants.insert(
            Role::Scheduler,
            BTreeSet::from([
                FACILITIES_VIEW,
                STAFF_VIEW,
                SHIFTS_VIEW,
                SHIFTS_CREATE,
                SHIFTS_UPDATE,
                SHIFTS_ASSIGN,
                TIMESHEETS_VIEW,
                CHAT_ACCESS,
            ]),
        );
        grants.insert(
            Role::Employee,
            BTreeSet::from([
                SHIFTS_VIEW,
                SHIFTS_CLAIM,
                TIMESHEETS_VIEW,
                TIMESHEETS_SUBMIT,
                CHAT_ACCESS,
            ]),
        );
        grants.insert(
            Role::Contractor,
            BTreeSet::from([SHIFTS_VIEW, SHIFTS_CLAIM, TIMESHEETS_SUBMIT, CHAT_ACCESS]),
        );
        grants.insert(
            Role::Viewer,
            BTreeSet::from([FACILITIES_VIEW, STAFF_VIEW, SHIFTS_VIEW]),
        );

        Self { grants }
    }

    /// Built-in grants with the roles named in `policy` replaced.
    pub fn from_policy(policy: &AccessPolicyConfig) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();

        for (tag, tokens) in &policy.roles {
            let role = Role::parse(tag);
            if !role.is_recognized() {
                return Err(CatalogError::UnrecognizedRole(tag.clone()));
            }
            if role.is_super_admin_class() {
                return Err(CatalogError::SuperAdminGrant(tag.clone()));
            }

            let set = tokens
                .iter()
                .map(|t| Permission::parse(t))
                .collect::<Result<BTreeSet<_>, _>>()?;
            catalog.grants.insert(role, set);
        }

        Ok(catalog)
    }

    /// Grants for `role`. Unrecognized roles get the viewer grants.
    pub fn permissions_for(&self, role: &Role) -> RoleGrants<'_> {
        if role.is_super_admin_class() {
            return RoleGrants::Universal;
        }

        let role = if role.is_recognized() { role } else { &FALLBACK_ROLE };
        RoleGrants::Tokens(self.grants.get(role).unwrap_or(&NO_GRANTS))
    }

    /// Whether `role` holds `permission`.
    pub fn role_has_permission(&self, role: &Role, permission: &Permission) -> bool {
        self.permissions_for(role).contains(permission)
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
