//! Types defining the AMS access token.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::role::RoleGrant;

/// Claims for the AMS access token JWT.
///
/// The client decodes these without verifying the signature; cryptographic
/// validation belongs to the gateway. The claims are only used for display
/// and role-derived authorization.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccessTokenClaims {
    /// Expiration time, Unix seconds. An absent value means the token is
    /// treated as already expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Subject the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Role grants, one per subsystem.
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

impl AccessTokenClaims {
    /// Whether the token is expired at the given wall-clock instant.
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        match self.exp {
            Some(exp) => exp * 1000 < now_millis,
            None => true,
        }
    }
}

/// Errors from decoding a token payload.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The token does not have the `header.payload.signature` shape.
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),

    /// The payload segment is not valid base64url.
    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payload is not UTF-8.
    #[error("payload is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The decoded payload is not a JSON claims object.
    #[error("payload is not a claims object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the payload segment of a JWT without verifying its signature.
pub fn decode_unverified(token: &str) -> Result<AccessTokenClaims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    // Tolerate both padded and unpadded base64url.
    let bytes = URL_SAFE_NO_PAD.decode(segments[1].trim_end_matches('='))?;
    let json = std::str::from_utf8(&bytes)?;

    Ok(serde_json::from_str(json)?)
}

/// Whether the token is expired right now.
///
/// Fail-closed: a token that cannot be decoded is expired.
pub fn is_expired(token: &str) -> bool {
    match decode_unverified(token) {
        Ok(claims) => claims.is_expired_at(now_millis()),
        Err(err) => {
            tracing::debug!(?err, "undecodable access token treated as expired");
            true
        }
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
