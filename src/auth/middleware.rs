//! 认证中间件
//!
//! 从 `Authorization` 头提取会话令牌（裸 token，不带 Bearer 前缀），
//! 经仓储解析为用户后把 [`CurrentUser`] 注入请求扩展。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::CurrentUser;
use crate::core::ServerState;
use crate::error::AppError;

/// Require a valid session token on the request
///
/// Applied to the cart, checkout, and order routers; handlers read the
/// injected [`CurrentUser`] from request extensions.
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 Unauthorized |
/// | 令牌无法解析 | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        tracing::warn!(uri = %req.uri(), "Request without authorization token");
        return Err(AppError::unauthorized());
    };

    match state.auth.resolve_token(token).await? {
        Some(user_id) => {
            req.extensions_mut().insert(CurrentUser { id: user_id });
            Ok(next.run(req).await)
        }
        None => {
            tracing::warn!(uri = %req.uri(), "Invalid session token");
            Err(AppError::invalid_token())
        }
    }
}
