//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → gateway.rs (route, resolve credential, forward, translate)
//!         → request.rs (allow-listed headers + credential + streamed body)
//!         → forwarder.rs (send to backend, redirects not followed)
//!         → response.rs (status, allow-listed headers, streamed body)
//!     → error.rs (any failure → JSON error response)
//!     → Send to client
//! ```

pub mod error;
pub mod forwarder;
pub mod gateway;
pub mod request;
pub mod response;
pub mod server;

pub use error::{GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{Proxied, ProxyOutcome};
pub use server::HttpServer;
