// handlers/protected/users/settings.rs - token balance, tutorial flag and push token handlers

use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::transaction_service::TransactionService;
use crate::services::user_service::UserService;

#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    pub token: Option<Value>,
}

/// GET /api/users/tokens
pub async fn user_tokens(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let balance = TransactionService::new().await?.balance(&auth.user_id).await?;
    Ok(ApiResponse::success(json!({ "tokenBalance": balance })))
}

/// POST /api/users/me/mark-calendar-tutorial-seen
pub async fn user_tutorial_seen(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let user = UserService::new().await?.mark_tutorial_seen(&auth.user_id).await?;
    Ok(ApiResponse::success(json!({
        "message": "Calendar tutorial marked as seen.",
        "user": user
    })))
}

/// POST /api/users/push-token - register this device for push delivery
pub async fn user_push_token(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<PushTokenRequest>,
) -> ApiResult<Value> {
    let token = match request.token {
        Some(Value::String(token)) if !token.trim().is_empty() => token,
        _ => return Err(ApiError::field_error("token", "Push token is required and must be a string.")),
    };

    UserService::new().await?.set_push_token(&auth.user_id, token.trim()).await?;
    Ok(ApiResponse::success(json!({ "message": "Push token saved." })))
}
