//! Authentication session facade for the ReelNet API client
//!
//! The identity provider is an external collaborator. This crate defines the
//! [`AuthSession`] contract the HTTP layer and route guards consume, a hosted
//! (OIDC-style) implementation that builds redirect URLs and holds tokens,
//! and a static implementation for service accounts and tests.

pub mod guard;
pub mod hosted;
pub mod session;

// Re-export main types
pub use guard::{GuardOutcome, RouteGuard};
pub use hosted::{HostedSession, TokenGrant};
pub use session::{AuthSession, Profile, StaticSession};
