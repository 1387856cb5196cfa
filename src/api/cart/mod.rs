//! Cart API Module
//!
//! Requires authentication; mounted behind the session middleware.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// Cart router (authenticated)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/cart", get(handler::get_cart).delete(handler::clear_cart))
        .route("/api/cart/items", post(handler::add_item))
        .route(
            "/api/cart/items/{collectible_id}",
            put(handler::update_item).delete(handler::remove_item),
        )
}
