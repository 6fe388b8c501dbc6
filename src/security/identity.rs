//! Caller identity and the identity provider client.
//!
//! # Responsibilities
//! - Extract the caller's session from the inbound request
//! - Exchange the session for a backend bearer token
//!
//! # Design Decisions
//! - Identity is resolved per request and never cached
//! - "No identity" is a normal answer (`Ok(None)`), not an error
//! - Session material never appears in Debug output or logs

use std::fmt;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Errors talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider returned {0}")]
    UnexpectedStatus(StatusCode),
}

/// The ambient identity of the current caller.
#[derive(Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    session: String,
}

impl CallerIdentity {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }

    /// Look for a session in the named cookie, then in `Authorization: Bearer`.
    pub fn from_headers(headers: &HeaderMap, session_cookie: &str) -> Option<Self> {
        let from_cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == session_cookie && !value.is_empty())
            .map(|(_, value)| value.to_string());

        let session = from_cookie.or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })?;

        Some(Self { session })
    }

    pub fn session(&self) -> &str {
        &self.session
    }
}

impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("session", &"<redacted>")
            .finish()
    }
}

/// Issues bearer tokens for the current caller.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns `Ok(None)` when the provider does not recognise the caller.
    async fn token(&self, caller: &CallerIdentity) -> Result<Option<String>, IdentityError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(alias = "jwt")]
    token: Option<String>,
}

/// Build the client used for identity provider calls.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
}

/// Identity provider reached over HTTP.
///
/// Sends `GET token_url` with the session as a bearer credential and expects
/// `{"token": "..."}` back.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    token_url: Url,
}

impl HttpIdentityProvider {
    pub fn new(client: reqwest::Client, token_url: Url) -> Self {
        Self { client, token_url }
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn token(&self, caller: &CallerIdentity) -> Result<Option<String>, IdentityError> {
        let response = self
            .client
            .get(self.token_url.clone())
            .bearer_auth(caller.session())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        match response.status() {
            status if status.is_success() => {
                let body: TokenResponse = response.json().await.map_err(reqwest::Error::without_url)?;
                Ok(body.token.filter(|t| !t.is_empty()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            status => Err(IdentityError::UnexpectedStatus(status)),
        }
    }
}
