//! Backend request proxy gateway for the dashboard.
//!
//! Receives every API request from the web client, attaches the caller's
//! credential, forwards it to the backend API service and relays the
//! response (redirects, cookies and streamed bodies included).

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use http::{Gateway, HttpServer};
pub use lifecycle::Shutdown;
