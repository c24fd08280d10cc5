// handlers/protected/users/blocks.rs - user blocking handlers

use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::PublicUser;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::UserService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    #[serde(default)]
    pub user_id: String,
}

impl BlockRequest {
    fn target(&self) -> Result<&str, ApiError> {
        let target = self.user_id.trim();
        if target.is_empty() {
            return Err(ApiError::field_error("userId", "userId is required."));
        }
        Ok(target)
    }
}

/// POST /api/users/block
pub async fn user_block(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<BlockRequest>,
) -> ApiResult<Value> {
    UserService::new().await?.block(&auth.user_id, request.target()?).await?;
    Ok(ApiResponse::created(json!({ "message": "User blocked successfully." })))
}

/// POST /api/users/unblock
pub async fn user_unblock(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<BlockRequest>,
) -> ApiResult<Value> {
    UserService::new().await?.unblock(&auth.user_id, request.target()?).await?;
    Ok(ApiResponse::success(json!({ "message": "User unblocked successfully." })))
}

/// GET /api/users/me/blocked
pub async fn user_blocked_list(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<PublicUser>> {
    let users = UserService::new().await?.blocked_users(&auth.user_id).await?;
    Ok(ApiResponse::success(users))
}
