//! HTTP calls to the authentication gateway.

use http::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::{
    error,
    profile::{ProfileUpdate, UserProfile},
    Error,
};

/// Credentials for the token-obtain endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Account email address.
    pub email: String,

    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
pub(crate) struct ObtainedTokens {
    /// Absent when the gateway delivers the token via `Set-Cookie` only.
    #[serde(default)]
    pub access: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Deserialize)]
struct RefreshedToken {
    access: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserListing {
    Wrapped { users: Vec<UserProfile> },
    Bare(Vec<UserProfile>),
}

pub(crate) struct Gateway {
    http: reqwest::Client,
    base_url: reqwest::Url,
}

impl Gateway {
    pub fn new(http: reqwest::Client, base_url: reqwest::Url) -> Self {
        Self { http, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    pub async fn obtain_token(&self, credentials: &Credentials) -> Result<ObtainedTokens, Error> {
        let response = self
            .http
            .post(self.endpoint("/token/obtain"))
            .json(credentials)
            .send()
            .await
            .map_err(error::network)?;

        if response.status().is_success() {
            response.json().await.map_err(error::network)
        } else {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail);
            Err(Error::Credentials(
                detail.unwrap_or_else(|| "invalid email or password".to_string()),
            ))
        }
    }

    /// Any HTTP or transport failure counts as a failed verification.
    pub async fn verify_token(&self, token: &str) -> Result<(), Error> {
        self.http
            .post(self.endpoint("/token/verify"))
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(error::network)?
            .error_for_status()
            .map_err(error::http)?;

        Ok(())
    }

    /// The refresh credential travels via the cookie jar, not a parameter.
    pub async fn refresh_token(&self) -> Result<String, Error> {
        let refreshed: RefreshedToken = self
            .http
            .post(self.endpoint("/token/refresh"))
            .send()
            .await
            .map_err(error::network)?
            .error_for_status()
            .map_err(error::http)?
            .json()
            .await
            .map_err(error::network)?;

        Ok(refreshed.access)
    }

    pub async fn fetch_profile(&self, token: &str) -> Result<UserProfile, Error> {
        self.http
            .get(self.endpoint("/users/profile"))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(error::network)?
            .error_for_status()
            .map_err(error::http)?
            .json()
            .await
            .map_err(error::network)
    }

    pub async fn update_profile(
        &self,
        token: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, Error> {
        let request = match update.attachment {
            Some((file_name, bytes)) => {
                let mut form = reqwest::multipart::Form::new();
                for (field, value) in update.fields {
                    let text = match value {
                        serde_json::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    form = form.text(field, text);
                }
                form = form.part(
                    "avatar",
                    reqwest::multipart::Part::bytes(bytes).file_name(file_name),
                );
                self.http
                    .patch(self.endpoint("/users/profile"))
                    .multipart(form)
            }
            None => self
                .http
                .patch(self.endpoint("/users/profile"))
                .json(&update.fields),
        };

        request
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(error::network)?
            .error_for_status()
            .map_err(error::http)?
            .json()
            .await
            .map_err(error::network)
    }

    /// The endpoint returns either a bare array or `{"users": [...]}`.
    pub async fn list_users(&self, token: &str) -> Result<Vec<UserProfile>, Error> {
        let listing: UserListing = self
            .http
            .get(self.endpoint("/users/list"))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(error::network)?
            .error_for_status()
            .map_err(error::http)?
            .json()
            .await
            .map_err(error::network)?;

        Ok(match listing {
            UserListing::Wrapped { users } => users,
            UserListing::Bare(users) => users,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), Error> {
        self.http
            .post(self.endpoint("/logout"))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(error::network)?
            .error_for_status()
            .map_err(error::http)?;

        Ok(())
    }
}
