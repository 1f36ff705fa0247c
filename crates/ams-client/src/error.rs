/// Errors that can happen either during client configuration or while
/// communicating with the gateway.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A problem with the client configuration.
    #[error("configuration error: {0}")]
    Config(&'static str),

    /// The stored access token could not be decoded.
    #[error("invalid access token: {0}")]
    InvalidAccessToken(anyhow::Error),

    /// The token was rejected by the verification endpoint, or the operation
    /// requires an authenticated session and none exists.
    #[error("unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    /// The authenticated user has no role grant for this system.
    #[error("no access to system {0:?}")]
    NoSystemAccess(String),

    /// Login was rejected.
    #[error("login failed: {0}")]
    Credentials(String),

    /// A network problem.
    #[error("network error: {0}")]
    Network(anyhow::Error),

    /// Other type of unclassified error.
    #[error("unclassified error: {0}")]
    Unclassified(anyhow::Error),
}

pub(crate) fn unclassified(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::Unclassified(anyhow::Error::from(err))
}

pub(crate) fn network(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::Network(anyhow::Error::from(err))
}

pub(crate) fn http(err: reqwest::Error) -> Error {
    match err.status() {
        Some(status) if status == reqwest::StatusCode::UNAUTHORIZED => Error::Unauthorized(err.into()),
        Some(status) if status == reqwest::StatusCode::FORBIDDEN => Error::Unauthorized(err.into()),
        _ => Error::Network(err.into()),
    }
}
