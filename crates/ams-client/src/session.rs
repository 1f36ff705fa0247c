//! The session state machine.

use std::sync::{atomic::Ordering, Arc};

use ams_common::access_token;

use crate::{gateway::Credentials, profile::SessionUser, ClientState, Error};

/// A snapshot of the session state.
///
/// Snapshots are immutable; every transition publishes a new one through the
/// client's watch channel.
#[derive(Clone, Debug)]
pub struct Session {
    pub(crate) user: Option<SessionUser>,
    pub(crate) loading: bool,
    pub(crate) initialized: bool,
}

impl Session {
    pub(crate) fn checking() -> Self {
        Self {
            user: None,
            loading: true,
            initialized: false,
        }
    }

    pub(crate) fn unauthenticated() -> Self {
        Self {
            user: None,
            loading: false,
            initialized: true,
        }
    }

    pub(crate) fn authenticated(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            loading: false,
            initialized: true,
        }
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// True while an auth check is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True once the first auth check has completed, success or failure.
    ///
    /// UIs gate their initial render on this to avoid flashing a login
    /// screen at a user whose session is still being checked.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a user is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Why establishing a session failed.
///
/// Several variants collapse to the same published state, but they are kept
/// distinct so callers can produce differentiated messaging.
#[derive(Debug)]
pub(crate) enum CheckFailure {
    /// No token anywhere; nothing to tear down.
    NoToken,
    /// The stored token is undecodable or locally expired; not worth a
    /// round trip to the verification endpoint.
    TokenExpired,
    /// The verification endpoint rejected the token or was unreachable.
    Verification(Error),
    /// Token and profile are valid, but no role grant covers this system.
    NoSystemAccess,
}

impl ClientState {
    pub(crate) async fn check_auth_status(&self) -> bool {
        self.check_auth_detailed().await.is_ok()
    }

    /// The single source of truth for (re)establishing session validity.
    ///
    /// Overlapping calls are resolved by a generation counter: only the most
    /// recently issued call applies its result to the published session.
    pub(crate) async fn check_auth_detailed(&self) -> Result<(), CheckFailure> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let current = self.session.load();
            self.publish_if_current(
                generation,
                Session {
                    user: current.user.clone(),
                    loading: true,
                    initialized: current.initialized,
                },
            );
        }

        match self.establish_session().await {
            Ok(user) => {
                self.publish_if_current(generation, Session::authenticated(user));
                Ok(())
            }
            Err(failure) => {
                if !matches!(failure, CheckFailure::NoToken) {
                    self.store.clear();
                }
                self.publish_if_current(generation, Session::unauthenticated());
                Err(failure)
            }
        }
    }

    async fn establish_session(&self) -> Result<SessionUser, CheckFailure> {
        let Some(token) = self.store.get() else {
            return Err(CheckFailure::NoToken);
        };

        let claims = match access_token::decode_unverified(&token) {
            Ok(claims) if !claims.is_expired_at(access_token::now_millis()) => claims,
            Ok(_) => return Err(CheckFailure::TokenExpired),
            Err(err) => {
                tracing::debug!(?err, "stored access token is undecodable");
                return Err(CheckFailure::TokenExpired);
            }
        };

        self.gateway
            .verify_token(&token)
            .await
            .map_err(CheckFailure::Verification)?;

        // A profile outage must not log the user out; the token claims alone
        // make a usable session user.
        let profile = match self.gateway.fetch_profile(&token).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::warn!(?err, "profile fetch failed, continuing with token claims");
                None
            }
        };

        let user = SessionUser::merge(claims, profile);
        if !user.has_any_system_role(&self.system) {
            return Err(CheckFailure::NoSystemAccess);
        }

        Ok(user)
    }

    pub(crate) async fn login(&self, credentials: &Credentials) -> Result<(), Error> {
        let tokens = self.gateway.obtain_token(credentials).await?;

        match tokens.access {
            Some(access) => self.store.set(&access),
            None => {
                // The gateway may deliver the token via Set-Cookie only; the
                // cookie jar serves as the store's read fallback.
                if !self.store.has() {
                    return Err(Error::Credentials(
                        "login response carried no access token".to_string(),
                    ));
                }
            }
        }

        self.check_auth_detailed().await.map_err(|failure| match failure {
            CheckFailure::NoSystemAccess => Error::NoSystemAccess(self.system.clone()),
            CheckFailure::Verification(err) => err,
            CheckFailure::NoToken | CheckFailure::TokenExpired => Error::InvalidAccessToken(
                anyhow::anyhow!("login produced an unusable access token"),
            ),
        })
    }

    /// Remote invalidation is best-effort; local teardown is unconditional.
    pub(crate) async fn logout(&self) {
        if let Some(token) = self.store.get() {
            if let Err(err) = self.gateway.logout(&token).await {
                tracing::debug!(?err, "remote logout failed");
            }
        }

        self.store.clear();
        // Bump the generation so an in-flight check cannot resurrect the
        // session it raced with.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.publish(Session::unauthenticated());
    }

    fn publish(&self, session: Session) {
        let session = Arc::new(session);
        self.session.store(session.clone());
        self.session_tx.send_replace(session);
    }

    fn publish_if_current(&self, generation: u64, session: Session) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.publish(session);
        } else {
            tracing::debug!("discarding stale session check result");
        }
    }
}
