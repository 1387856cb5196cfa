//! Checkout API Handlers

use axum::{Extension, Json, extract::State};

use crate::api::ok;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::error::{ApiResponse, AppResult};
use crate::services::CheckoutSummary;

/// Run the cart-to-order saga for the authenticated user
pub async fn checkout_from_cart(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<CheckoutSummary>>> {
    let summary = state.checkout.checkout_from_cart(&user.id).await?;
    Ok(ok(summary))
}
