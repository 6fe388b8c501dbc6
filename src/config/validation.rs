//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check URLs, bind address and credential settings
//! - Compile every route so broken patterns fail at load time
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{CredentialMode, GatewayConfig};
use crate::routing::RouteTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("{field} '{url}' is invalid: {reason}")]
    Url {
        field: &'static str,
        url: String,
        reason: String,
    },

    #[error("bearer mode requires credentials.identity_provider.token_url")]
    MissingTokenUrl,

    #[error("credentials.identity_provider.session_cookie must not be empty")]
    EmptySessionCookie,

    #[error("no routes configured")]
    NoRoutes,

    #[error("{0}")]
    Route(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Err(e) = check_http_url("backend.base_url", &config.backend.base_url, &["http"]) {
        errors.push(e);
    }

    let idp = &config.credentials.identity_provider;
    if config.credentials.mode == CredentialMode::Bearer {
        match idp.token_url.as_deref() {
            None | Some("") => errors.push(ValidationError::MissingTokenUrl),
            Some(url) => {
                if let Err(e) = check_http_url("credentials.identity_provider.token_url", url, &["http", "https"]) {
                    errors.push(e);
                }
            }
        }
        if idp.session_cookie.trim().is_empty() {
            errors.push(ValidationError::EmptySessionCookie);
        }
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    } else if let Err(e) = RouteTable::from_config(&config.routes) {
        errors.push(ValidationError::Route(e.to_string()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The backend is reached over plain HTTP only; the identity provider may use TLS.
fn check_http_url(field: &'static str, raw: &str, schemes: &[&str]) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::Url {
        field,
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !schemes.contains(&url.scheme()) {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".into()));
    }
    Ok(())
}
