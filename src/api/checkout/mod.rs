//! Checkout API Module (multi-item cart saga)

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Checkout router (authenticated)
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/checkout", post(handler::checkout_from_cart))
}
