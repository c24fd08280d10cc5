// handlers/protected/stories/mod.rs - GET /api/stories/:date handler

use axum::{extract::Path, Extension};

use crate::database::models::Story;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::calendar_day_service::CalendarDayService;

/// Nearby users' finished videos for a day, closest first
pub async fn stories_get(Extension(auth): Extension<AuthUser>, Path(date): Path<String>) -> ApiResult<Vec<Story>> {
    let stories = CalendarDayService::new().await?.stories(&auth.user_id, &date).await?;
    Ok(ApiResponse::success(stories))
}
