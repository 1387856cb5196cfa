//! Cart API Handlers
//!
//! The cart is intent only: no stock checks, no reservations. Missing carts
//! are created on demand.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::api::ok;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::error::{ApiResponse, AppError, AppResult, ErrorCode};
use crate::models::{Cart, CartItem};
use crate::util::now_millis;

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub collectible_id: String,
    pub store_id: String,
    pub rental_days: u32,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub rental_days: u32,
    pub quantity: u32,
}

async fn get_or_create_cart(state: &ServerState, user_id: &str) -> AppResult<Cart> {
    if let Some(cart) = state.repo.get_active_cart(user_id).await? {
        return Ok(cart);
    }
    let cart = Cart::new_active(user_id);
    state.repo.create_cart(cart.clone()).await?;
    Ok(cart)
}

/// The user's active cart (created if absent)
pub async fn get_cart(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = get_or_create_cart(&state, &user.id).await?;
    Ok(ok(cart))
}

/// Add an item, merging quantity on (collectible, store)
pub async fn add_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    if req.collectible_id.is_empty()
        || req.store_id.is_empty()
        || req.rental_days < 1
        || req.quantity < 1
    {
        return Err(AppError::validation("Invalid cart item data"));
    }

    let cart = get_or_create_cart(&state, &user.id).await?;
    let updated = state
        .repo
        .add_cart_item(
            &cart.id,
            CartItem {
                collectible_id: req.collectible_id.clone(),
                store_id: req.store_id,
                rental_days: req.rental_days,
                quantity: req.quantity,
            },
        )
        .await?;

    tracing::info!(
        user_id = %user.id,
        collectible_id = %req.collectible_id,
        quantity = req.quantity,
        "Item added to cart"
    );
    Ok(ok(updated))
}

/// Update rental days and quantity of an item
pub async fn update_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(collectible_id): Path<String>,
    Json(req): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    if req.rental_days < 1 || req.quantity < 1 {
        return Err(AppError::validation("Invalid cart item data"));
    }

    let cart = state
        .repo
        .get_active_cart(&user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartNotFound))?;

    // The store target of the existing line is preserved
    let existing = cart
        .items
        .iter()
        .find(|i| i.collectible_id == collectible_id)
        .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound))?;

    let updated = state
        .repo
        .update_cart_item(
            &cart.id,
            &collectible_id,
            CartItem {
                collectible_id: collectible_id.clone(),
                store_id: existing.store_id.clone(),
                rental_days: req.rental_days,
                quantity: req.quantity,
            },
        )
        .await?;

    Ok(ok(updated))
}

/// Remove an item from the cart
pub async fn remove_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(collectible_id): Path<String>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let cart = state
        .repo
        .get_active_cart(&user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartNotFound))?;

    let updated = state.repo.remove_cart_item(&cart.id, &collectible_id).await?;

    tracing::info!(
        user_id = %user.id,
        collectible_id = %collectible_id,
        "Item removed from cart"
    );
    Ok(ok(updated))
}

/// Clear all items
pub async fn clear_cart(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let mut cart = state
        .repo
        .get_active_cart(&user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartNotFound))?;

    cart.items.clear();
    cart.updated_at = now_millis();
    state.repo.update_cart(cart.clone()).await?;

    Ok(ok(cart))
}
