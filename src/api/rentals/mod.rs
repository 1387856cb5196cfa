//! Rentals API Module (legacy single-item path)

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Rentals router (public)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/rentals/quote", post(handler::quote))
        .route("/api/rentals/checkout", post(handler::checkout))
}
