// handlers/protected/notifications/mod.rs - Notification inbox handlers

use axum::Extension;
use serde_json::{json, Value};

use crate::config::config;
use crate::database::models::Notification;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::notification_service::NotificationService;

/// GET /api/notifications - unread first; falls back to recent read ones
pub async fn notifications_list(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<Notification>> {
    let page_size = config().notifications.page_size;
    let notifications = NotificationService::new().await?.list(&auth.user_id, page_size).await?;
    Ok(ApiResponse::success(notifications))
}

/// GET /api/notifications/unread-count
pub async fn notifications_unread_count(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let count = NotificationService::new().await?.unread_count(&auth.user_id).await?;
    Ok(ApiResponse::success(json!({ "unreadCount": count })))
}

/// POST /api/notifications/mark-as-read
pub async fn notifications_mark_read(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let updated = NotificationService::new().await?.mark_all_read(&auth.user_id).await?;
    Ok(ApiResponse::success(json!({
        "message": "Notifications marked as read.",
        "updated": updated
    })))
}
