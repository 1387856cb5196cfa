//! Authentication
//!
//! Password hashing, opaque session tokens, and the axum middleware that
//! resolves a bearer token to a [`CurrentUser`]. Tokens carry no expiry;
//! logout deletes them from the session table.

mod middleware;
mod service;

pub use middleware::require_auth;
pub use service::{AuthPayload, AuthService};

/// The authenticated user attached to a request by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}
