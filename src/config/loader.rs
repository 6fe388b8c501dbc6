//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{CredentialMode, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
pub const ENV_BACKEND_URL: &str = "BACKEND_URL";
pub const ENV_IDENTITY_PROVIDER_URL: &str = "IDENTITY_PROVIDER_URL";
pub const ENV_SESSION_COOKIE: &str = "SESSION_COOKIE";
pub const ENV_CREDENTIAL_MODE: &str = "CREDENTIAL_MODE";

/// Load a TOML file (or defaults when `path` is `None`), apply environment
/// overrides and validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment-supplied settings.
///
/// `IDENTITY_PROVIDER_URL` activates bearer mode; an explicit
/// `CREDENTIAL_MODE` still wins over that.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(url) = lookup(ENV_BACKEND_URL) {
        config.backend.base_url = url;
    }
    if let Some(url) = lookup(ENV_IDENTITY_PROVIDER_URL) {
        config.credentials.identity_provider.token_url = Some(url);
        config.credentials.mode = CredentialMode::Bearer;
    }
    if let Some(name) = lookup(ENV_SESSION_COOKIE) {
        config.credentials.identity_provider.session_cookie = name;
    }
    if let Some(mode) = lookup(ENV_CREDENTIAL_MODE) {
        match mode.parse() {
            Ok(mode) => config.credentials.mode = mode,
            Err(e) => tracing::warn!(error = %e, "Ignoring {}", ENV_CREDENTIAL_MODE),
        }
    }
}
