//! `ams-client` is an asynchronous Rust client handle for applications driving
//! the AMS authentication gateway.
//!
//! The handle owns the access token, derives the authenticated user and role
//! set from it, silently refreshes the token in the background and exposes
//! authorization predicates to the embedding application. UI layers observe a
//! [session::Session] snapshot and never touch token storage directly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::{atomic::AtomicU64, Arc};

use arc_swap::ArcSwap;

use crate::{
    gateway::Gateway,
    profile::{ProfileUpdate, UserProfile},
    session::Session,
    store::TokenStore,
};

/// Route guarding helpers.
pub mod guard;

/// User profile types.
pub mod profile;

/// Session state types.
pub mod session;

/// Token persistence.
pub mod store;

mod background_worker;
mod builder;
mod error;
mod gateway;

pub use builder::ClientBuilder;
pub use error::Error;
pub use gateway::Credentials;

/// The AMS client handle.
///
/// Cheap to clone; all clones share one session. Constructed through
/// [Client::builder].
#[derive(Clone)]
pub struct Client {
    pub(crate) state: Arc<ClientState>,
}

pub(crate) struct ClientState {
    pub(crate) gateway: Gateway,
    pub(crate) store: TokenStore,
    pub(crate) system: String,
    pub(crate) refresh_interval: std::time::Duration,
    pub(crate) session: ArcSwap<Session>,
    pub(crate) session_tx: tokio::sync::watch::Sender<Arc<Session>>,
    pub(crate) generation: AtomicU64,
    pub(crate) closed_tx: tokio::sync::watch::Sender<()>,
}

impl Client {
    /// Construct a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The subsystem identifier this client authorizes against.
    pub fn system(&self) -> &str {
        &self.state.system
    }

    /// The current session snapshot.
    pub fn session(&self) -> Arc<Session> {
        self.state.session.load_full()
    }

    /// Subscribe to session snapshots.
    ///
    /// A new snapshot is published on every state transition; the receiver
    /// always holds the latest one.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Arc<Session>> {
        self.state.session_tx.subscribe()
    }

    /// Re-establish session validity from the stored token.
    ///
    /// Verifies the stored token against the gateway and loads the user
    /// profile, then publishes either an authenticated or an unauthenticated
    /// snapshot. Locally expired tokens are rejected without a network round
    /// trip. Returns whether the session is authenticated afterwards.
    pub async fn check_auth_status(&self) -> bool {
        self.state.check_auth_status().await
    }

    /// Force a fresh validity guarantee before a sensitive action.
    ///
    /// Runs the same check as [Client::check_auth_status]; the snapshot's
    /// `loading` flag is raised for the duration of the call.
    pub async fn refresh_auth(&self) -> bool {
        self.state.check_auth_status().await
    }

    /// Exchange credentials for an access token and establish a session.
    ///
    /// On success the full session check runs before this returns; login
    /// never short-circuits profile and role loading. A user without a role
    /// grant for this client's system fails with [Error::NoSystemAccess] and
    /// leaves no session state behind.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), Error> {
        self.state.login(credentials).await
    }

    /// End the session.
    ///
    /// Remote invalidation is best-effort; the local teardown is
    /// unconditional and cannot fail.
    pub async fn logout(&self) {
        self.state.logout().await
    }

    /// Update the authenticated user's profile.
    ///
    /// Sent as multipart when the update carries a file attachment, JSON
    /// otherwise.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, Error> {
        let token = self.require_token()?;
        self.state.gateway.update_profile(&token, update).await
    }

    /// List the users known to the gateway.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, Error> {
        let token = self.require_token()?;
        self.state.gateway.list_users(&token).await
    }

    /// Stop the background refresh worker.
    ///
    /// Dropping every [Client] handle stops it as well.
    pub fn close(&self) {
        let _ = self.state.closed_tx.send(());
    }

    fn require_token(&self) -> Result<String, Error> {
        self.state
            .store
            .get()
            .ok_or_else(|| Error::Unauthorized(anyhow::anyhow!("no access token stored")))
    }
}
