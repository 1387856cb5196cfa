//! Payments API Module (webhooks and redirect handlers)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Payments router (public; the gateway calls these)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/webhooks/paymongo", post(handler::webhook))
        .route("/payment/success", get(handler::payment_success))
        .route("/payment/failed", get(handler::payment_failed))
}
