//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway state transitions produce:
//!     → logging.rs (structured log events, request id on every event)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
