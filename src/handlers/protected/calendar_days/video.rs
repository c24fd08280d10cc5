// handlers/protected/calendar_days/video.rs - story video attach/refresh/delete handlers
//
// Clients upload the file to Vimeo themselves; these endpoints only record
// the resulting video URI and track Vimeo's processing state.

use axum::{extract::Path, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::CalendarDay;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::calendar_day_service::CalendarDayService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachVideoRequest {
    #[serde(default)]
    pub vimeo_uri: String,
}

/// PUT /api/calendarDays/:date/video
pub async fn calendar_video_put(
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
    ApiJson(request): ApiJson<AttachVideoRequest>,
) -> ApiResult<Value> {
    let attached = CalendarDayService::new()
        .await?
        .attach_video(&auth.user_id, &date, &request.vimeo_uri)
        .await?;

    Ok(ApiResponse::success(json!({
        "message": "Video saved. It will be visible once Vimeo finishes processing.",
        "calendarDay": attached.calendar_day,
        "hasNearbyStories": attached.has_nearby_stories
    })))
}

/// POST /api/calendarDays/:date/refresh-status
pub async fn calendar_video_refresh(
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
) -> ApiResult<CalendarDay> {
    let day = CalendarDayService::new().await?.refresh_status(&auth.user_id, &date).await?;
    Ok(ApiResponse::success(day))
}

/// DELETE /api/calendarDays/:date/video
pub async fn calendar_video_delete(Extension(auth): Extension<AuthUser>, Path(date): Path<String>) -> ApiResult<Value> {
    CalendarDayService::new().await?.delete_video(&auth.user_id, &date).await?;
    Ok(ApiResponse::success(json!({ "message": "Video deleted successfully." })))
}
