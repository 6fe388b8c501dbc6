//! Response translation.
//!
//! # Responsibilities
//! - Copy status (and any non-canonical reason phrase) verbatim
//! - Stream the backend body through unchanged
//! - Copy only allow-listed headers, every `Set-Cookie` kept separately
//!
//! # Design Decisions
//! - Content-agnostic: the body is never parsed or re-serialized
//! - Redirects are surfaced as-is with their `Location`

use axum::{
    body::{Body, Bytes, HttpBody},
    response::Response,
    BoxError,
};
use hyper::ext::ReasonPhrase;

use crate::http::forwarder::is_redirect;
use crate::security::headers;

/// Terminal state of a proxied call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyOutcome {
    /// Backend answered (any status other than a followed-up redirect).
    Responded,
    /// Backend answered 3xx with `Location`; passed to the client unfollowed.
    Redirected,
    /// No credential; the backend was never called.
    Unauthorized,
    /// Transport or gateway-internal failure.
    Failed,
    /// No route matched the inbound path.
    Unrouted,
}

impl ProxyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyOutcome::Responded => "responded",
            ProxyOutcome::Redirected => "redirected",
            ProxyOutcome::Unauthorized => "unauthorized",
            ProxyOutcome::Failed => "failed",
            ProxyOutcome::Unrouted => "unrouted",
        }
    }
}

/// A client-facing response and how it came about.
#[derive(Debug)]
pub struct Proxied {
    pub outcome: ProxyOutcome,
    pub response: Response,
}

/// Convert the backend response into the client response.
pub fn translate<B>(upstream: axum::http::Response<B>) -> Proxied
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = upstream.into_parts();
    let redirect = is_redirect(parts.status, &parts.headers);
    let headers = headers::response_headers(&parts.headers, redirect);

    let mut response = Response::new(Body::new(body));
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    if let Some(reason) = parts.extensions.get::<ReasonPhrase>() {
        response.extensions_mut().insert(reason.clone());
    }

    let outcome = if redirect {
        ProxyOutcome::Redirected
    } else {
        ProxyOutcome::Responded
    };

    Proxied { outcome, response }
}
