//! The proxy gateway.
//!
//! One call moves through:
//!
//! ```text
//! RECEIVED ─▶ CREDENTIAL_RESOLVED ─▶ FORWARDED ─┬─▶ REDIRECTED
//!                 │                              ├─▶ RESPONDED
//!                 ▼                              └─▶ FAILED
//!            UNAUTHORIZED
//! ```
//!
//! The gateway is stateless. It owns the route table, the credential strategy
//! and the forwarder; a new configuration builds a new `Gateway`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::{ConfigError, CredentialMode, GatewayConfig};
use crate::http::error::GatewayError;
use crate::http::forwarder::{self, Forwarder};
use crate::http::request::{request_id, OutboundRequest};
use crate::http::response::{translate, Proxied, ProxyOutcome};
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::security::credentials::{BearerToken, CookieForwarding, CredentialResolver};
use crate::security::identity::{self, HttpIdentityProvider};

pub struct Gateway {
    routes: RouteTable,
    credentials: Arc<dyn CredentialResolver>,
    forwarder: Forwarder,
}

impl Gateway {
    pub fn new(routes: RouteTable, credentials: Arc<dyn CredentialResolver>, forwarder: Forwarder) -> Self {
        Self {
            routes,
            credentials,
            forwarder,
        }
    }

    /// Build the gateway a validated config describes.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let routes = RouteTable::from_config(&config.routes).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let base_url = Url::parse(&config.backend.base_url)
            .map_err(|e| ConfigError::Invalid(format!("backend.base_url: {}", e)))?;
        if base_url.scheme() != "http" {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url: unsupported scheme '{}'",
                base_url.scheme()
            )));
        }

        let credentials: Arc<dyn CredentialResolver> = match config.credentials.mode {
            CredentialMode::Cookie => Arc::new(CookieForwarding),
            CredentialMode::Bearer => {
                let idp = &config.credentials.identity_provider;
                let token_url = idp
                    .token_url
                    .as_deref()
                    .ok_or_else(|| ConfigError::Invalid("bearer mode requires identity_provider.token_url".into()))
                    .and_then(|u| {
                        Url::parse(u).map_err(|e| ConfigError::Invalid(format!("identity_provider.token_url: {}", e)))
                    })?;
                let client = identity::build_client().map_err(ConfigError::Client)?;
                let provider = HttpIdentityProvider::new(client, token_url);
                Arc::new(BearerToken::new(Arc::new(provider), idp.session_cookie.clone()))
            }
        };

        tracing::info!(
            backend = %base_url,
            credential_mode = credentials.mode().as_str(),
            routes = routes.len(),
            "Gateway configured"
        );

        Ok(Self::new(routes, credentials, Forwarder::new(forwarder::build_client(), base_url)))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn credential_mode(&self) -> CredentialMode {
        self.credentials.mode()
    }

    pub fn backend_url(&self) -> &Url {
        self.forwarder.base_url()
    }

    /// Route the request and proxy it. Always yields a response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request_id(request.headers()).to_string();

        let backend_path = match self.routes.resolve(&method, &path) {
            Some(route) => {
                tracing::debug!(
                    request_id = %request_id,
                    route = route.name,
                    backend_path = %route.backend_path,
                    "Route resolved"
                );
                route.backend_path
            }
            None => {
                tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
                metrics::record_request(&method, 404, ProxyOutcome::Unrouted, start);
                return GatewayError::RouteNotFound(path).into_response();
            }
        };

        let (outcome, response) = match self.proxy(request, &backend_path).await {
            Ok(Proxied { outcome, response }) => (outcome, response),
            Err(GatewayError::Unauthorized) => {
                tracing::info!(request_id = %request_id, path = %path, "Rejected: no credential");
                (ProxyOutcome::Unauthorized, GatewayError::Unauthorized.into_response())
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, path = %path, error = %e, "Proxy failed");
                (ProxyOutcome::Failed, e.into_response())
            }
        };

        let status = response.status();
        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            backend_path = %backend_path,
            status = status.as_u16(),
            outcome = outcome.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Proxied request"
        );
        metrics::record_request(&method, status.as_u16(), outcome, start);

        response
    }

    /// Proxy one request to `backend_path` on the backend.
    pub async fn proxy(&self, request: Request<Body>, backend_path: &str) -> Result<Proxied, GatewayError> {
        let (parts, body) = request.into_parts();

        let credential = self.credentials.resolve(&parts.headers).await?;

        let uri = self.forwarder.target(backend_path, parts.uri.query())?;
        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let outbound = OutboundRequest::build(
            parts.method,
            uri,
            &parts.headers,
            body,
            credential.as_ref(),
            client_ip,
        )?;

        let upstream = self.forwarder.forward(outbound).await?;
        Ok(translate(upstream))
    }
}
