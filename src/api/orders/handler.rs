//! Orders API Handlers
//!
//! Responses use view structs: the allocated `unit_id` / `warehouse_id` of
//! an order item are internal and never serialized to clients.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::api::ok;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::error::{ApiResponse, AppError, AppResult, ErrorCode};
use crate::models::{Order, OrderStatus, Refund};
use crate::services::CancellationOutcome;

/// Order item as exposed to clients (no allocation internals)
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub collectible_id: String,
    pub collectible_name: String,
    pub rental_days: u32,
    pub eta_days: u32,
    pub price: f64,
}

/// Order as exposed to clients
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: String,
    pub user_id: String,
    pub store_id: String,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub items: Vec<OrderItemView>,
    pub payment_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            store_id: order.store_id,
            status: order.status,
            total_amount: order.total_amount,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemView {
                    collectible_id: item.collectible_id,
                    collectible_name: item.collectible_name,
                    rental_days: item.rental_days,
                    eta_days: item.eta_days,
                    price: item.price,
                })
                .collect(),
            payment_id: order.payment_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Load an order and verify it belongs to the caller
async fn load_owned_order(state: &ServerState, user_id: &str, order_id: &str) -> AppResult<Order> {
    let order = state
        .repo
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if order.user_id != user_id {
        return Err(AppError::forbidden("Access denied"));
    }
    Ok(order)
}

/// All orders of the authenticated user
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Vec<OrderView>>>> {
    let orders = state.repo.get_orders_by_user(&user.id).await?;
    Ok(ok(orders.into_iter().map(OrderView::from).collect()))
}

/// A single order
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let order = load_owned_order(&state, &user.id, &id).await?;
    Ok(ok(OrderView::from(order)))
}

/// Cancel an order and process the refund the eligibility table allows
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CancellationOutcome>>> {
    let order = load_owned_order(&state, &user.id, &id).await?;
    let outcome = state.orders.cancel_order(order).await?;

    tracing::info!(
        order_id = %id,
        user_id = %user.id,
        refund_amount = outcome.refund_amount,
        "Order cancelled by user"
    );
    Ok(ok(outcome))
}

/// Refund status for an order
pub async fn refund_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Refund>>> {
    load_owned_order(&state, &user.id, &id).await?;

    let refund = state
        .refunds
        .get_refund_by_order(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RefundNotFound))?;

    Ok(ok(refund))
}
