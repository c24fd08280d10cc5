// handlers/protected/dates/date_patch.rs - date update, cancel and feedback handlers

use axum::{extract::Path, Extension};

use crate::database::models::{DateEntry, DateFeedback};
use crate::handlers::parse_uuid;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::date_service::{DateService, DateUpdate, FeedbackRequest};

/// PATCH /api/dates/:dateId - reschedule, or approve/decline a pending date
pub async fn date_patch(
    Extension(auth): Extension<AuthUser>,
    Path(date_id): Path<String>,
    ApiJson(update): ApiJson<DateUpdate>,
) -> ApiResult<DateEntry> {
    let date_id = parse_uuid(&date_id, "date id")?;
    let date = DateService::new().await?.update(&auth.user_id, date_id, update).await?;
    Ok(ApiResponse::success(date))
}

/// PATCH /api/dates/:dateId/cancel
pub async fn date_cancel(Extension(auth): Extension<AuthUser>, Path(date_id): Path<String>) -> ApiResult<DateEntry> {
    let date_id = parse_uuid(&date_id, "date id")?;
    let date = DateService::new().await?.cancel(&auth.user_id, date_id).await?;
    Ok(ApiResponse::success(date))
}

/// PATCH /api/dates/:dateId/feedback
pub async fn date_feedback(
    Extension(auth): Extension<AuthUser>,
    Path(date_id): Path<String>,
    ApiJson(request): ApiJson<FeedbackRequest>,
) -> ApiResult<DateFeedback> {
    let date_id = parse_uuid(&date_id, "date id")?;
    let feedback = DateService::new()
        .await?
        .record_feedback(&auth.user_id, date_id, request)
        .await?;
    Ok(ApiResponse::created(feedback))
}
