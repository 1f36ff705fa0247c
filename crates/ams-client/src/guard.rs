//! Route guarding helpers.

use fnv::FnvHashSet;

use crate::Client;

/// The set of roles allowed to open a protected route.
///
/// Membership checks ignore case.
#[derive(Clone, Debug, Default)]
pub struct RequiredRoles {
    roles: FnvHashSet<String>,
}

impl RequiredRoles {
    /// Build a role set from role names.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|role| role.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether `role` is a member.
    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains(&role.to_ascii_lowercase())
    }
}

/// What the navigation layer should do with a protected route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the protected content.
    Allow,
    /// No authenticated session; go to the login entry point.
    RedirectToLogin,
    /// Authenticated but not authorized; render nothing.
    Forbidden,
}

impl Client {
    /// Decide whether the current session may open a route guarded by
    /// `required`.
    ///
    /// The user's primary role for this client's own system is matched
    /// against the set.
    pub fn authorize_route(&self, required: &RequiredRoles) -> RouteDecision {
        let session = self.session();
        let Some(user) = session.user() else {
            return RouteDecision::RedirectToLogin;
        };

        match user.system_role(&self.state.system) {
            Some(role) if required.contains(role) => RouteDecision::Allow,
            _ => RouteDecision::Forbidden,
        }
    }
}
