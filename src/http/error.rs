//! Gateway error taxonomy and its HTTP rendering.
//!
//! Every failure inside one proxied call ends up here and is turned into a
//! well-formed JSON response. Upstream non-2xx responses and redirects are
//! not errors; they pass through untouched.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::security::identity::IdentityError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No route declared for the inbound path.
    #[error("no route for {0}")]
    RouteNotFound(String),

    /// No resolvable credential for the caller. The backend is never called.
    #[error("unauthorized")]
    Unauthorized,

    /// The identity provider could not be asked for a token.
    #[error(transparent)]
    IdentityProvider(#[from] IdentityError),

    /// The credential could not be encoded as a header value.
    #[error("credential is not a valid header value")]
    InvalidCredential,

    /// The outbound URL could not be built.
    #[error("invalid backend target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Transport failure reaching the backend (DNS, refused, reset, timeout).
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::IdentityProvider(_)
            | GatewayError::InvalidCredential
            | GatewayError::InvalidTarget { .. }
            | GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic text for 500 bodies. Client errors are flattened with their
    /// source chain so "connection refused" is visible to the caller. Target
    /// URLs are never part of it.
    fn diagnostic(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            GatewayError::RouteNotFound(path) => json!({
                "error": "Not found",
                "path": path,
            }),
            GatewayError::Unauthorized => json!({ "error": "Unauthorized" }),
            _ => json!({
                "error": "Internal server error",
                "message": self.diagnostic(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
