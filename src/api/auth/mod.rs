//! Auth API Module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Auth router (public)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout))
}
