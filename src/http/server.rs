//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Hand every request to the current `Gateway`
//! - Swap in a new `Gateway` when the configuration changes

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig};
use crate::http::gateway::Gateway;
use crate::http::request::UuidRequestId;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Gateway>>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let gateway = Gateway::from_config(&config)?;
        Ok(Self::with_gateway(config, gateway))
    }

    /// Create a server around an already-built gateway (e.g. one with a
    /// custom credential strategy).
    pub fn with_gateway(config: GatewayConfig, gateway: Gateway) -> Self {
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(gateway)),
        };
        let router = Self::build_router(state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Each config received on `config_updates` replaces the gateway; an
    /// update that fails to build is logged and dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let inner = self.state.inner.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match Gateway::from_config(&config) {
                    Ok(gateway) => {
                        inner.store(Arc::new(gateway));
                        tracing::info!("Gateway reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected config update, keeping current gateway");
                    }
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The gateway currently serving requests.
    pub fn gateway(&self) -> Arc<Gateway> {
        self.state.inner.load_full()
    }
}

/// Main proxy handler.
///
/// If the client goes away, axum drops this future and the in-flight
/// backend request with it.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let gateway = state.inner.load_full();
    gateway.handle(request).await
}
