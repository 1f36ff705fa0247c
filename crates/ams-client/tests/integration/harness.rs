//! A mock authentication gateway backed by axum.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ams_common::{access_token::AccessTokenClaims, role::RoleGrant};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{EncodingKey, Header};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "p";

pub struct MockGateway {
    /// Tokens the verify endpoint accepts.
    pub valid_tokens: Mutex<Vec<String>>,
    /// Token returned from the obtain endpoint body, when any.
    pub obtain_access: Mutex<Option<String>>,
    /// When true, obtain delivers the token via `Set-Cookie` instead of the
    /// response body.
    pub obtain_via_cookie: Mutex<bool>,
    /// Token returned from the refresh endpoint; `None` makes refresh fail.
    pub refresh_access: Mutex<Option<String>>,
    /// Profile payload; `None` makes the profile endpoint return 500.
    pub profile: Mutex<Option<Value>>,
    pub verify_hits: AtomicUsize,
    pub refresh_hits: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            valid_tokens: Mutex::new(Vec::new()),
            obtain_access: Mutex::new(None),
            obtain_via_cookie: Mutex::new(false),
            refresh_access: Mutex::new(None),
            profile: Mutex::new(None),
            verify_hits: AtomicUsize::new(0),
            refresh_hits: AtomicUsize::new(0),
        })
    }
}

/// Serve the mock gateway on an ephemeral port, returning its base URL.
pub async fn serve(mock: Arc<MockGateway>) -> String {
    let app = Router::new()
        .route("/token/obtain", post(obtain))
        .route("/token/verify", post(verify))
        .route("/token/refresh", post(refresh))
        .route("/users/profile", get(profile))
        .route("/logout", post(logout))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// Mint a signed token with the given expiry and role grants.
pub fn mint_token(exp: i64, roles: &[(&str, &str)]) -> String {
    let claims = AccessTokenClaims {
        exp: Some(exp),
        sub: Some(EMAIL.to_string()),
        roles: roles
            .iter()
            .map(|(system, role)| RoleGrant {
                system: system.to_string(),
                role: role.to_string(),
            })
            .collect(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"integration"),
    )
    .unwrap()
}

pub fn future_exp() -> i64 {
    ams_common::access_token::now_millis() / 1000 + 3600
}

pub fn past_exp() -> i64 {
    ams_common::access_token::now_millis() / 1000 - 3600
}

async fn obtain(State(mock): State<Arc<MockGateway>>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email != Some(EMAIL) || password != Some(PASSWORD) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "invalid credentials" })),
        )
            .into_response();
    }

    let access = mock.obtain_access.lock().clone();
    match access {
        Some(access) if *mock.obtain_via_cookie.lock() => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::SET_COOKIE,
                format!("access_token={access}; Path=/").parse().unwrap(),
            );
            (StatusCode::OK, headers, Json(json!({}))).into_response()
        }
        Some(access) => (StatusCode::OK, Json(json!({ "access": access }))).into_response(),
        None => (StatusCode::OK, Json(json!({}))).into_response(),
    }
}

async fn verify(State(mock): State<Arc<MockGateway>>, Json(body): Json<Value>) -> StatusCode {
    mock.verify_hits.fetch_add(1, Ordering::SeqCst);

    let token = body.get("token").and_then(Value::as_str).unwrap_or_default();
    if mock.valid_tokens.lock().iter().any(|valid| valid == token) {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn refresh(State(mock): State<Arc<MockGateway>>) -> Response {
    mock.refresh_hits.fetch_add(1, Ordering::SeqCst);

    match mock.refresh_access.lock().clone() {
        Some(access) => (StatusCode::OK, Json(json!({ "access": access }))).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn profile(State(mock): State<Arc<MockGateway>>) -> Response {
    match mock.profile.lock().clone() {
        Some(profile) => (StatusCode::OK, Json(profile)).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::OK
}
