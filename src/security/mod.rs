//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → identity.rs (caller session → identity provider token)
//!     → credentials.rs (exactly one credential: cookie or bearer)
//!     → headers.rs (allow-listed passthrough, X-Forwarded-*)
//!     → Outbound request
//!
//! Backend response headers
//!     → headers.rs (allow-listed passthrough, every Set-Cookie)
//!     → Client response
//! ```
//!
//! # Design Decisions
//! - Fail closed: no credential in bearer mode → 401, backend untouched
//! - No trust in client input: arbitrary headers never cross the hop

pub mod credentials;
pub mod headers;
pub mod identity;

pub use credentials::{BearerToken, CookieForwarding, Credential, CredentialResolver};
pub use identity::{CallerIdentity, HttpIdentityProvider, IdentityError, IdentityProvider};
