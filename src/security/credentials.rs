//! Credential resolution strategies.
//!
//! Exactly one strategy is active per deployment:
//! - [`CookieForwarding`] forwards the inbound `Cookie` header unchanged
//! - [`BearerToken`] asks the identity provider for a fresh token per request
//!
//! The two are never combined; a bearer deployment does not fall back to
//! cookies and vice versa.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::CredentialMode;
use crate::http::error::GatewayError;
use crate::observability::metrics;
use crate::security::identity::{CallerIdentity, IdentityProvider};

/// Authentication material attached to one outbound request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Opaque cookie string forwarded from the client.
    Cookie(HeaderValue),
    /// Token issued by the identity provider.
    Bearer(String),
}

impl Credential {
    /// Overlay the credential onto outbound headers.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), GatewayError> {
        match self {
            Credential::Cookie(value) => {
                let mut value = value.clone();
                value.set_sensitive(true);
                headers.insert(header::COOKIE, value);
            }
            Credential::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| GatewayError::InvalidCredential)?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Cookie(_) => f.write_str("Credential::Cookie(<redacted>)"),
            Credential::Bearer(_) => f.write_str("Credential::Bearer(<redacted>)"),
        }
    }
}

/// Produces the credential for the current request.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    fn mode(&self) -> CredentialMode;

    /// `Ok(None)` means the request goes out without a credential.
    /// `Err(GatewayError::Unauthorized)` stops it before the backend is called.
    async fn resolve(&self, inbound: &HeaderMap) -> Result<Option<Credential>, GatewayError>;
}

/// Forwards the client's cookies verbatim. No identity provider round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieForwarding;

#[async_trait]
impl CredentialResolver for CookieForwarding {
    fn mode(&self) -> CredentialMode {
        CredentialMode::Cookie
    }

    async fn resolve(&self, inbound: &HeaderMap) -> Result<Option<Credential>, GatewayError> {
        let mut values = inbound.get_all(header::COOKIE).iter();
        let Some(first) = values.next() else {
            return Ok(None);
        };

        let rest: Vec<&HeaderValue> = values.collect();
        if rest.is_empty() {
            return Ok(Some(Credential::Cookie(first.clone())));
        }

        // HTTP/2 clients may split cookies across header lines.
        let mut joined = first.as_bytes().to_vec();
        for value in rest {
            joined.extend_from_slice(b"; ");
            joined.extend_from_slice(value.as_bytes());
        }
        let value = HeaderValue::from_bytes(&joined).map_err(|_| GatewayError::InvalidCredential)?;
        Ok(Some(Credential::Cookie(value)))
    }
}

/// Fetches a bearer token from the identity provider on every request.
pub struct BearerToken {
    provider: Arc<dyn IdentityProvider>,
    session_cookie: String,
}

impl BearerToken {
    pub fn new(provider: Arc<dyn IdentityProvider>, session_cookie: impl Into<String>) -> Self {
        Self {
            provider,
            session_cookie: session_cookie.into(),
        }
    }
}

#[async_trait]
impl CredentialResolver for BearerToken {
    fn mode(&self) -> CredentialMode {
        CredentialMode::Bearer
    }

    async fn resolve(&self, inbound: &HeaderMap) -> Result<Option<Credential>, GatewayError> {
        let Some(caller) = CallerIdentity::from_headers(inbound, &self.session_cookie) else {
            tracing::debug!("No caller session present");
            metrics::record_identity_lookup("no_session");
            return Err(GatewayError::Unauthorized);
        };

        match self.provider.token(&caller).await {
            Ok(Some(token)) => {
                metrics::record_identity_lookup("issued");
                Ok(Some(Credential::Bearer(token)))
            }
            Ok(None) => {
                tracing::debug!("Identity provider did not recognise caller");
                metrics::record_identity_lookup("rejected");
                Err(GatewayError::Unauthorized)
            }
            Err(e) => {
                tracing::error!(error = %e, "Identity provider lookup failed");
                metrics::record_identity_lookup("error");
                Err(GatewayError::IdentityProvider(e))
            }
        }
    }
}
