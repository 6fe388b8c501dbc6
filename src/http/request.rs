//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Derive the outbound request from the inbound one
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing; it stays on the
//!   client side of the hop and is not forwarded
//! - The target URI is assembled from raw strings; path and query are never
//!   normalized or re-encoded
//! - The inbound body is passed on as a stream, never buffered
//! - GET and HEAD are forwarded without a body

use std::net::IpAddr;

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, HeaderValue, Method, Request, Uri},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::http::error::GatewayError;
use crate::security::credentials::Credential;
use crate::security::headers;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 for requests that arrive without an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Join the backend base URL, the rewritten path and the inbound query.
///
/// The query string is appended byte for byte. A path prefix on the base URL
/// is kept in front of `backend_path`.
pub fn target_uri(base: &Url, backend_path: &str, query: Option<&str>) -> Result<Uri, GatewayError> {
    let mut target = String::with_capacity(base.as_str().len() + backend_path.len() + 16);
    target.push_str(base.as_str().trim_end_matches('/'));
    if !backend_path.starts_with('/') {
        target.push('/');
    }
    target.push_str(backend_path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }

    Uri::try_from(target.as_str()).map_err(|e| GatewayError::InvalidTarget {
        reason: e.to_string(),
        target,
    })
}

/// The request actually sent to the backend.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Body,
}

impl OutboundRequest {
    /// Build from inbound parts: allow-listed headers, exactly one credential
    /// (if any), and the body as a live stream.
    ///
    /// `Content-Length` is set whenever the inbound body size is known, so an
    /// empty DELETE or POST is not sent chunked.
    pub fn build(
        method: Method,
        uri: Uri,
        inbound_headers: &HeaderMap,
        body: Body,
        credential: Option<&Credential>,
        client_ip: Option<IpAddr>,
    ) -> Result<Self, GatewayError> {
        let mut headers = headers::outbound_headers(inbound_headers, client_ip);
        if let Some(credential) = credential {
            credential.apply(&mut headers)?;
        }

        let body = if carries_body(&method) {
            if let Some(len) = body.size_hint().exact() {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
            }
            body
        } else {
            Body::empty()
        };

        Ok(Self {
            method,
            uri,
            headers,
            body,
        })
    }

    /// Convert into the request handed to the HTTP client.
    pub fn into_request(self) -> Request<Body> {
        let mut request = Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;
        request
    }
}

fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}
