//! Token persistence across storage areas and the cookie jar.
//!
//! The store is the single writer of session artifacts. Application code
//! observes the session through the client handle and must not reach into
//! storage directly.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};

/// Storage key the access token is persisted under.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Cookie holding the access token when the gateway sets it server-side.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie name used by older gateway deployments.
pub const LEGACY_ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Keys written by earlier client generations, purged on logout.
const LEGACY_KEYS: [&str; 3] = ["access_token", "refresh_token", "user"];

/// A mutable string-keyed storage area.
///
/// Two areas back a [crate::Client]: a persistent scope that outlives the
/// process and a session scope that does not. The default in-memory
/// implementation suits tests and short-lived tools; embedders provide their
/// own for durable storage.
pub trait StorageArea: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove `key` if present.
    fn remove(&self, key: &str);
}

/// In-memory [StorageArea].
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl StorageArea for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

pub(crate) struct TokenStore {
    persistent: Arc<dyn StorageArea>,
    session_scope: Arc<dyn StorageArea>,
    cookies: Arc<Jar>,
    url: reqwest::Url,
}

impl TokenStore {
    pub fn new(
        persistent: Arc<dyn StorageArea>,
        session_scope: Arc<dyn StorageArea>,
        cookies: Arc<Jar>,
        url: reqwest::Url,
    ) -> Self {
        Self {
            persistent,
            session_scope,
            cookies,
            url,
        }
    }

    pub fn has(&self) -> bool {
        self.get().is_some()
    }

    /// Primary storage wins over cookies; the current cookie name is tried
    /// before the legacy one.
    pub fn get(&self) -> Option<String> {
        self.persistent
            .get(ACCESS_TOKEN_KEY)
            .or_else(|| self.cookie(ACCESS_TOKEN_COOKIE))
            .or_else(|| self.cookie(LEGACY_ACCESS_TOKEN_COOKIE))
    }

    /// The cookie is set by the gateway, never by the client; only primary
    /// storage is written here.
    pub fn set(&self, token: &str) {
        self.persistent.set(ACCESS_TOKEN_KEY, token);
    }

    /// Remove every session artifact: the primary key, keys left behind by
    /// earlier client generations in both storage areas, and the
    /// access-token cookie. Idempotent.
    pub fn clear(&self) {
        self.persistent.remove(ACCESS_TOKEN_KEY);
        for key in LEGACY_KEYS {
            self.persistent.remove(key);
            self.session_scope.remove(key);
        }
        self.expire_cookie(ACCESS_TOKEN_COOKIE);
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.cookies.cookies(&self.url)?;
        read_cookie(header.to_str().ok()?, name)
    }

    fn expire_cookie(&self, name: &str) {
        self.cookies.add_cookie_str(
            &format!("{name}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT"),
            &self.url,
        );
    }
}

/// Extract a named cookie value from a `Cookie` header string.
///
/// The name is regex-escaped before matching and the value percent-decoded
/// after extraction; an unmatched name or an empty value yields `None`.
pub(crate) fn read_cookie(header: &str, name: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?:^|;\s*){}=([^;]*)", regex::escape(name))).ok()?;
    let value = pattern.captures(header)?.get(1)?.as_str();
    if value.is_empty() {
        return None;
    }

    Some(match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    })
}
