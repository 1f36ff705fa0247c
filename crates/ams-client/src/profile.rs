//! User profile and merged session-user types.

use ams_common::{
    access_token::AccessTokenClaims,
    role::{self, RoleGrant},
};
use serde::Deserialize;

/// A user profile fetched from the gateway.
///
/// Profiles carry no authorization data; the type has no roles field, so a
/// profile response structurally cannot overwrite token-derived roles.
#[derive(Clone, Debug, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) avatar_url: Option<String>,
}

impl UserProfile {
    /// Display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Email address.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Department the user belongs to.
    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    /// Phone number.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Avatar image URL.
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }
}

/// The authenticated user: token claims merged with the fetched profile.
///
/// Role grants always originate from the token. The profile half is absent
/// when the profile endpoint was unreachable at check time; the session
/// stays usable regardless.
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub(crate) subject: Option<String>,
    pub(crate) roles: Vec<RoleGrant>,
    pub(crate) profile: Option<UserProfile>,
}

impl SessionUser {
    pub(crate) fn merge(claims: AccessTokenClaims, profile: Option<UserProfile>) -> Self {
        Self {
            subject: claims.sub,
            roles: claims.roles,
            profile,
        }
    }

    /// Subject identifier from the token.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Role grants from the token.
    pub fn roles(&self) -> &[RoleGrant] {
        &self.roles
    }

    /// The fetched profile, if the profile endpoint was reachable.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Display name from the profile.
    pub fn name(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|profile| profile.name())
    }

    /// Email from the profile, falling back to the token subject.
    pub fn email(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|profile| profile.email())
            .or(self.subject.as_deref())
    }

    /// Whether the user holds `role` within `system`, ignoring case.
    pub fn has_system_role(&self, system: &str, role: &str) -> bool {
        role::has_system_role(&self.roles, system, role)
    }

    /// Whether the user holds any role within `system`.
    pub fn has_any_system_role(&self, system: &str) -> bool {
        role::has_any_system_role(&self.roles, system)
    }

    /// The user's primary role within `system`: the first matching grant.
    pub fn system_role(&self, system: &str) -> Option<&str> {
        role::get_system_role(&self.roles, system)
    }
}

/// A profile update request.
#[derive(Default)]
pub struct ProfileUpdate {
    pub(crate) fields: serde_json::Map<String, serde_json::Value>,
    pub(crate) attachment: Option<(String, Vec<u8>)>,
}

impl ProfileUpdate {
    /// Start an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a profile field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Attach a file; the update is sent as multipart when present.
    pub fn attachment(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachment = Some((file_name.into(), bytes));
        self
    }
}
