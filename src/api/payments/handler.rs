//! Payments API Handlers
//!
//! The webhook endpoint parses the payload into a tagged event once, hands
//! it to the order service, and always answers 200. The gateway retries on
//! its own schedule and reconciliation is idempotent.

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::error::{ApiResponse, AppError, AppResult, ErrorCode};
use crate::payment::WebhookEvent;

/// Gateway webhook events
pub async fn webhook(
    State(state): State<ServerState>,
    Json(payload): Json<serde_json::Value>,
) -> Json<ApiResponse<()>> {
    let event = WebhookEvent::parse(&payload);
    tracing::debug!(event = ?event, "Webhook received");
    state.orders.handle_webhook(event).await;
    Json(ApiResponse::ok())
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub rental_id: Option<String>,
    pub order_id: Option<String>,
}

/// Payment success redirect: confirm the reservation, then send the
/// customer to the result page
pub async fn payment_success(
    State(state): State<ServerState>,
    Query(query): Query<RedirectQuery>,
) -> AppResult<Redirect> {
    if let Some(rental_id) = &query.rental_id {
        let rental = state
            .repo
            .get_rental(rental_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RentalNotFound))?;
        state.orders.complete_payment_for_rental(rental).await?;
        return Ok(Redirect::to(&format!("/success.html?rental_id={rental_id}")));
    }

    if let Some(order_id) = &query.order_id {
        let order = state
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        state.orders.complete_payment_for_order(&order).await?;
        return Ok(Redirect::to(&format!("/success.html?order_id={order_id}")));
    }

    Err(AppError::not_found("Rental"))
}

/// Payment failure redirect: release the held units, then send the
/// customer to the result page
pub async fn payment_failed(
    State(state): State<ServerState>,
    Query(query): Query<RedirectQuery>,
) -> AppResult<Redirect> {
    if let Some(rental_id) = &query.rental_id {
        let rental = state
            .repo
            .get_rental(rental_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RentalNotFound))?;
        state.orders.fail_payment_for_rental(rental).await?;
        return Ok(Redirect::to(&format!("/failed.html?rental_id={rental_id}")));
    }

    if let Some(order_id) = &query.order_id {
        let order = state
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        state.orders.fail_payment_for_order(&order).await?;
        return Ok(Redirect::to(&format!("/failed.html?order_id={order_id}")));
    }

    Err(AppError::not_found("Rental"))
}
