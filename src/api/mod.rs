//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册 / 登录 / 登出
//! - [`collectibles`] - 目录查询（带动态库存与 ETA）
//! - [`rentals`] - 报价与单件结算（兼容路径）
//! - [`cart`] - 购物车（纯意向，不占库存）
//! - [`checkout`] - 购物车多件结算 saga
//! - [`orders`] - 订单查询 / 取消 / 退款状态
//! - [`payments`] - 网关 webhook 与支付回跳
//! - [`admin`] - 管理面板数据

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod collectibles;
pub mod health;
pub mod orders;
pub mod payments;
pub mod rentals;

use axum::{Json, Router, middleware as axum_middleware};
use serde::Serialize;

use crate::auth::require_auth;
use crate::core::ServerState;
use crate::error::ApiResponse;

/// Assemble the full application router
///
/// Cart, checkout, and order routes sit behind the session-token
/// middleware; everything else is public.
pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .merge(cart::router())
        .merge(checkout::router())
        .merge(orders::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(collectibles::router())
        .merge(rentals::router())
        .merge(payments::router())
        .merge(admin::router())
        .merge(protected)
        .with_state(state)
}

/// Create a successful JSON response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}
