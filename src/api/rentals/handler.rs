//! Rentals API Handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::api::ok;
use crate::core::ServerState;
use crate::error::{ApiResponse, AppError, AppResult, ErrorCode};
use crate::models::Size;
use crate::pricing;
use crate::services::{SingleCheckoutRequest, SingleCheckoutResponse};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub collectible_id: String,
    pub store_id: Option<String>,
    pub duration: u32,
}

/// Calculated rental quote with live availability
#[derive(Debug, Serialize)]
pub struct QuoteView {
    pub collectible_id: String,
    pub collectible_name: String,
    pub size: Size,
    pub duration: u32,
    pub daily_rate: f64,
    pub total_fee: f64,
    pub is_special_rate: bool,
    pub stock: usize,
    pub eta: u32,
}

/// Quote a rental fee for a collectible and duration
pub async fn quote(
    State(state): State<ServerState>,
    Json(req): Json<QuoteRequest>,
) -> AppResult<Json<ApiResponse<QuoteView>>> {
    if req.duration < 1 {
        return Err(AppError::validation("Duration must be at least 1 day"));
    }

    let collectible = state
        .repo
        .get_collectible(&req.collectible_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CollectibleNotFound))?;

    let fee = pricing::calculate_rental_fee(collectible.size, req.duration);
    let stock = state.allocator.get_total_stock(&collectible.id);
    // ETA degrades to 0 when no store was picked or nothing is in stock
    let eta = req
        .store_id
        .as_deref()
        .and_then(|store| state.allocator.get_eta(&collectible.id, store).ok())
        .unwrap_or(0);

    Ok(ok(QuoteView {
        collectible_id: collectible.id,
        collectible_name: collectible.name,
        size: collectible.size,
        duration: req.duration,
        daily_rate: fee.daily_rate,
        total_fee: fee.total_fee,
        is_special_rate: fee.is_special_rate,
        stock,
        eta,
    }))
}

/// Legacy single-item checkout (idempotent per customer and collectible)
pub async fn checkout(
    State(state): State<ServerState>,
    Json(req): Json<SingleCheckoutRequest>,
) -> AppResult<Json<ApiResponse<SingleCheckoutResponse>>> {
    if req.duration < 1 {
        return Err(AppError::validation("Duration must be at least 1 day"));
    }
    if req.collectible_id.is_empty() || req.store_id.is_empty() {
        return Err(AppError::validation("Collectible and store are required"));
    }
    if req.customer.email.is_empty() {
        return Err(AppError::validation("Customer email is required"));
    }

    let response = state.checkout.checkout_single(req).await?;
    Ok(ok(response))
}
