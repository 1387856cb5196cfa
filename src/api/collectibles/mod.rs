//! Collectibles API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Collectibles router (public)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/collectibles", get(handler::list))
        .route("/api/collectibles/{id}", get(handler::get_by_id))
}
