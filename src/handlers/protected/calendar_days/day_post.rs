// handlers/protected/calendar_days/day_post.rs - POST /api/calendarDays handler

use axum::Extension;
use serde::Deserialize;

use crate::database::models::CalendarDay;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::calendar_day_service::CalendarDayService;

#[derive(Debug, Deserialize)]
pub struct CreateDayRequest {
    #[serde(default)]
    pub date: String,
}

pub async fn calendar_day_post(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateDayRequest>,
) -> ApiResult<CalendarDay> {
    let day = CalendarDayService::new().await?.create(&auth.user_id, &request.date).await?;
    Ok(ApiResponse::created(day))
}
