//! Auth API Handlers

use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;

use crate::api::ok;
use crate::auth::AuthPayload;
use crate::core::ServerState;
use crate::error::{ApiResponse, AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create a user and open a session
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<AuthPayload>>> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let payload = state.auth.register(&req.email, &req.password).await?;
    Ok(ok(payload))
}

/// Authenticate by email and password
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthPayload>>> {
    let payload = state.auth.login(&req.email, &req.password).await?;
    Ok(ok(payload))
}

/// Invalidate the caller's session token
pub async fn logout(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<()>>> {
    let token = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::validation("No authorization token provided"))?;

    state.auth.logout(token).await?;
    Ok(Json(ApiResponse::ok()))
}
