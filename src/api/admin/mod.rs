//! Admin API Module (dashboard data)

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Admin router
pub fn router() -> Router<ServerState> {
    Router::new().route("/admin/dashboard/api", get(handler::dashboard))
}
