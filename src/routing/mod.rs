//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate pattern, capture parameters)
//!     → Return: backend path or NoMatch
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Compile patterns and templates
//!     → Sort by priority
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Pure: no side effects, no network access
//! - Deterministic: same input always resolves to the same backend path
//! - First match wins (ordered by priority)
//! - Unmatched paths are a 404 produced by the server, not the gateway

pub mod matcher;
pub mod router;

pub use matcher::{Captures, PathPattern, PathTemplate, PatternError};
pub use router::{ResolvedRoute, Route, RouteError, RouteTable};
