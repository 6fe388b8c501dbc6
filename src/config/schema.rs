//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend API service the gateway forwards to.
    pub backend: BackendConfig,

    /// Credential strategy attached to every outbound call.
    pub credentials: CredentialConfig,

    /// Route table mapping inbound paths to backend paths.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Backend API service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "http://api.internal:8000").
    /// A path component is kept as a prefix of every forwarded path.
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Which credential strategy the deployment runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    /// Forward the inbound `Cookie` header verbatim.
    #[default]
    Cookie,
    /// Fetch a bearer token from the identity provider on every request.
    Bearer,
}

impl CredentialMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialMode::Cookie => "cookie",
            CredentialMode::Bearer => "bearer",
        }
    }
}

impl std::str::FromStr for CredentialMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(CredentialMode::Cookie),
            "bearer" | "token" => Ok(CredentialMode::Bearer),
            other => Err(format!("unknown credential mode '{}'", other)),
        }
    }
}

/// Credential resolution settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CredentialConfig {
    /// Active strategy. Exactly one per deployment.
    pub mode: CredentialMode,

    /// Identity provider used by the bearer strategy.
    pub identity_provider: IdentityProviderConfig,
}

/// Identity provider settings (bearer mode only).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityProviderConfig {
    /// Endpoint returning the current caller's token.
    pub token_url: Option<String>,

    /// Name of the cookie carrying the caller's session.
    pub session_cookie: String,
}

impl Default for IdentityProviderConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            session_cookie: "__session".to_string(),
        }
    }
}

/// Declarative route mapping an inbound path pattern to a backend path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Inbound pattern, e.g. "/api/auth/{*path}".
    pub source: String,

    /// Backend path template, e.g. "/auth/{path}".
    pub destination: String,

    /// Methods served by this route. Empty = any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

impl RouteConfig {
    pub fn new(name: &str, source: &str, destination: &str, methods: &[&str], priority: u32) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            priority,
        }
    }
}

/// The dashboard's API surface.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("auth", "/api/auth/{*path}", "/auth/{path}", &["GET", "POST"], 10),
        RouteConfig::new("repositories", "/api/repositories", "/api/repositories", &["GET"], 10),
        RouteConfig::new("repositories-sync", "/api/repositories/sync", "/api/repositories/sync", &["POST"], 10),
        RouteConfig::new("api-keys", "/api/api-keys", "/api/api-keys", &["GET", "POST"], 10),
        RouteConfig::new("api-key", "/api/api-keys/{id}", "/api/api-keys/{id}", &["DELETE"], 10),
        RouteConfig::new("token", "/api/tokens/{id}", "/api/tokens/{id}", &["DELETE"], 10),
        RouteConfig::new("integrations-jira", "/api/integrations/jira", "/api/integrations/jira", &["GET", "POST", "DELETE"], 10),
        RouteConfig::new("onboarding-token", "/api/onboarding/token", "/api/onboarding/token", &["POST"], 10),
        RouteConfig::new("onboarding-status", "/api/onboarding/status", "/api/onboarding/status", &["GET"], 10),
        RouteConfig::new("dashboard-metrics", "/api/dashboard/metrics", "/api/dashboard/metrics", &["GET"], 10),
        RouteConfig::new("api", "/api/{*path}", "/{path}", &[], 0),
    ]
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backend: BackendConfig::default(),
            credentials: CredentialConfig::default(),
            routes: default_routes(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [backend]
            base_url = "http://api.example.com/v1"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "http://api.example.com/v1");
        assert_eq!(config.credentials.mode, CredentialMode::Cookie);
        assert_eq!(config.credentials.identity_provider.session_cookie, "__session");
        assert_eq!(config.routes.len(), default_routes().len());
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_default_config_has_dashboard_routes() {
        let config = GatewayConfig::default();
        assert_eq!(config.routes.len(), default_routes().len());
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_bearer_mode_and_routes() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [credentials]
            mode = "bearer"

            [credentials.identity_provider]
            token_url = "http://idp.local/token"

            [[routes]]
            name = "all"
            source = "/api/{*path}"
            destination = "/v2/{path}"
            "#,
        )
        .unwrap();

        assert_eq!(config.credentials.mode, CredentialMode::Bearer);
        assert_eq!(
            config.credentials.identity_provider.token_url.as_deref(),
            Some("http://idp.local/token")
        );
        assert_eq!(config.routes.len(), 1);
        assert!(config.routes[0].methods.is_empty());
    }

    #[test]
    fn test_credential_mode_from_str() {
        assert_eq!("Cookie".parse::<CredentialMode>(), Ok(CredentialMode::Cookie));
        assert_eq!("bearer".parse::<CredentialMode>(), Ok(CredentialMode::Bearer));
        assert_eq!("token".parse::<CredentialMode>(), Ok(CredentialMode::Bearer));
        assert!("both".parse::<CredentialMode>().is_err());
    }
}
