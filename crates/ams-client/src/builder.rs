use std::{
    borrow::Cow,
    sync::{atomic::AtomicU64, Arc},
    time::Duration,
};

use arc_swap::ArcSwap;
use reqwest::cookie::Jar;

use crate::{
    background_worker::spawn_background_worker,
    error,
    gateway::Gateway,
    session::Session,
    store::{MemoryStorage, StorageArea, TokenStore},
    Client, ClientState, Error,
};

const DEFAULT_URL: &str = "https://ams-gateway";
const DEFAULT_SYSTEM: &str = "ams";
const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A builder for configuring a [Client].
pub struct ClientBuilder {
    url: Cow<'static, str>,
    system: Cow<'static, str>,
    refresh_interval: Duration,
    request_timeout: Duration,
    persistent: Option<Arc<dyn StorageArea>>,
    session_scope: Option<Arc<dyn StorageArea>>,
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            url: Cow::Borrowed(DEFAULT_URL),
            system: Cow::Borrowed(DEFAULT_SYSTEM),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            persistent: None,
            session_scope: None,
        }
    }

    /// Configure the builder from the environment it runs in.
    ///
    /// `AMS_GATEWAY_URL` is required; `AMS_SYSTEM` overrides the subsystem
    /// identifier when set.
    pub fn from_environment(mut self) -> Result<Self, Error> {
        let url = std::env::var("AMS_GATEWAY_URL")
            .map_err(|_| Error::Config("AMS_GATEWAY_URL is not set"))?;
        self.url = url.into();

        if let Ok(system) = std::env::var("AMS_SYSTEM") {
            self.system = system.into();
        }

        Ok(self)
    }

    /// Override the gateway URL (default is `https://ams-gateway`).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into().into();
        self
    }

    /// Override the subsystem identifier role grants are matched against
    /// (default is `"ams"`).
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into().into();
        self
    }

    /// Override the background token-refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Override the per-request timeout.
    ///
    /// Requests that exceed it fail like any other network error, so a hung
    /// gateway cannot leave the session loading forever.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Use the given persistent storage area for the access token.
    pub fn with_persistent_storage(mut self, storage: Arc<dyn StorageArea>) -> Self {
        self.persistent = Some(storage);
        self
    }

    /// Use the given session-scoped storage area.
    pub fn with_session_storage(mut self, storage: Arc<dyn StorageArea>) -> Self {
        self.session_scope = Some(storage);
        self
    }

    /// Connect to the gateway.
    ///
    /// Runs the initial session check against the stored token and spawns
    /// the background refresh worker; the returned handle's session is
    /// already initialized.
    pub async fn connect(self) -> Result<Client, Error> {
        let base_url: reqwest::Url = self
            .url
            .parse()
            .map_err(|_| Error::Config("invalid gateway URL"))?;

        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .timeout(self.request_timeout)
            .build()
            .map_err(error::unclassified)?;

        let store = TokenStore::new(
            self.persistent
                .unwrap_or_else(|| Arc::new(MemoryStorage::default())),
            self.session_scope
                .unwrap_or_else(|| Arc::new(MemoryStorage::default())),
            cookies,
            base_url.clone(),
        );

        let (session_tx, _session_rx) = tokio::sync::watch::channel(Arc::new(Session::checking()));
        let (closed_tx, closed_rx) = tokio::sync::watch::channel(());

        let state = Arc::new(ClientState {
            gateway: Gateway::new(http, base_url),
            store,
            system: self.system.into_owned(),
            refresh_interval: self.refresh_interval,
            session: ArcSwap::new(Arc::new(Session::checking())),
            session_tx,
            generation: AtomicU64::new(0),
            closed_tx,
        });

        spawn_background_worker(&state, closed_rx);

        state.check_auth_status().await;

        Ok(Client { state })
    }
}
