// handlers/protected/users/profile.rs - user create/read/update/delete handlers

use axum::{extract::Path, Extension};
use serde_json::{json, Value};

use crate::database::models::User;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{NewUser, UserChanges, UserService};

/// POST /api/users - create the caller's profile on first sign-in
///
/// Idempotent: an existing user is returned with 200, a new one with 201.
/// `email` is only required when the user does not exist yet.
pub async fn user_create(
    Extension(auth): Extension<AuthUser>,
    body: Option<ApiJson<NewUser>>,
) -> ApiResult<User> {
    let new_user = body.map(|ApiJson(b)| b).unwrap_or_default();
    let (user, created) = UserService::new().await?.create_or_get(&auth.user_id, new_user).await?;

    if created {
        Ok(ApiResponse::created(user))
    } else {
        Ok(ApiResponse::success(user))
    }
}

/// PATCH /api/users - partial profile update
pub async fn user_update(
    Extension(auth): Extension<AuthUser>,
    ApiJson(changes): ApiJson<UserChanges>,
) -> ApiResult<User> {
    let user = UserService::new().await?.update(&auth.user_id, changes).await?;
    Ok(ApiResponse::success(user))
}

/// GET /api/users/:id
pub async fn user_get(Path(user_id): Path<String>) -> ApiResult<User> {
    let user = UserService::new().await?.get(&user_id).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/me - remove the caller's account and everything attached to it
pub async fn user_delete(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    UserService::new().await?.delete(&auth.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "User deleted successfully." })))
}
