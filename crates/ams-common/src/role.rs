//! Role grants and system-scoped role predicates.

use serde::{Deserialize, Serialize};

/// A role granted to a user within a single subsystem.
///
/// A user may carry several grants, one per subsystem. Grants form an
/// ordered sequence; lookups return the first match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Identifier of the subsystem the grant applies to, e.g. `"ams"`.
    pub system: String,

    /// Role name within that subsystem, e.g. `"Admin"`.
    pub role: String,
}

impl RoleGrant {
    /// Whether this grant applies to the given subsystem, ignoring case.
    pub fn matches_system(&self, system: &str) -> bool {
        self.system.eq_ignore_ascii_case(system)
    }

    /// Whether this grant is exactly the given system/role pair, ignoring
    /// case on both fields.
    pub fn matches(&self, system: &str, role: &str) -> bool {
        self.matches_system(system) && self.role.eq_ignore_ascii_case(role)
    }
}

/// True iff some grant matches both `system` and `role`.
pub fn has_system_role(roles: &[RoleGrant], system: &str, role: &str) -> bool {
    roles.iter().any(|grant| grant.matches(system, role))
}

/// True iff some grant matches `system`, with any role.
pub fn has_any_system_role(roles: &[RoleGrant], system: &str) -> bool {
    roles.iter().any(|grant| grant.matches_system(system))
}

/// The role of the first grant matching `system`, if any.
pub fn get_system_role<'a>(roles: &'a [RoleGrant], system: &str) -> Option<&'a str> {
    roles
        .iter()
        .find(|grant| grant.matches_system(system))
        .map(|grant| grant.role.as_str())
}
