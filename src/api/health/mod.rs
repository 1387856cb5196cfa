//! Health API Module

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::error::ApiResponse;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

/// Health router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(check))
}

async fn check() -> Json<ApiResponse<Health>> {
    super::ok(Health { status: "ok" })
}
