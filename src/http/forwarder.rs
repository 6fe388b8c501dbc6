//! Outbound request execution.
//!
//! # Responsibilities
//! - Issue the outbound request on the shared connection pool
//! - Never follow redirects; the caller observes them
//! - Turn transport failures into `GatewayError::Upstream`
//!
//! # Design Decisions
//! - The backend is reached over plain HTTP; the URI goes out exactly as
//!   built, with no normalization
//! - No retries and no timeouts beyond the transport defaults
//! - Dropping the returned future abandons the in-flight request, so a client
//!   disconnect cancels the backend call

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode, Uri},
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::http::error::GatewayError;
use crate::http::request::{target_uri, OutboundRequest};

pub type BackendClient = Client<HttpConnector, Body>;

/// Build the pooled client used for backend calls.
pub fn build_client() -> BackendClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// `3xx` with a `Location` header.
pub fn is_redirect(status: StatusCode, headers: &HeaderMap) -> bool {
    status.is_redirection() && headers.contains_key(header::LOCATION)
}

/// Executes outbound requests against one backend.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: BackendClient,
    base_url: Url,
}

impl Forwarder {
    pub fn new(client: BackendClient, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a backend path + inbound query against the base URL.
    pub fn target(&self, backend_path: &str, query: Option<&str>) -> Result<Uri, GatewayError> {
        target_uri(&self.base_url, backend_path, query)
    }

    /// Send the request and return the raw backend response, whatever its status.
    pub async fn forward(&self, outbound: OutboundRequest) -> Result<hyper::Response<Incoming>, GatewayError> {
        tracing::debug!(method = %outbound.method, uri = %outbound.uri, "Forwarding to backend");

        let target = outbound.uri.clone();
        self.client
            .request(outbound.into_request())
            .await
            .map_err(|e| {
                tracing::warn!(uri = %target, error = %e, "Backend unreachable");
                GatewayError::Upstream(e)
            })
    }
}
