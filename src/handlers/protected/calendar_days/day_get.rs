// handlers/protected/calendar_days/day_get.rs - calendar day lookup handlers

use axum::{extract::Path, Extension};

use crate::database::models::CalendarDay;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::calendar_day_service::{ActiveDate, CalendarDayService};

/// GET /api/calendarDays/user - the caller's days, newest first
pub async fn calendar_days_list(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<CalendarDay>> {
    let days = CalendarDayService::new().await?.list(&auth.user_id).await?;
    Ok(ApiResponse::success(days))
}

/// GET /api/calendarDays/active-dates
pub async fn calendar_active_dates(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<ActiveDate>> {
    let dates = CalendarDayService::new().await?.active_dates(&auth.user_id).await?;
    Ok(ApiResponse::success(dates))
}

/// GET /api/calendarDays/by-user/:userId/:date
pub async fn calendar_day_get(Path((user_id, date)): Path<(String, String)>) -> ApiResult<CalendarDay> {
    let day = CalendarDayService::new().await?.get(&user_id, &date).await?;
    Ok(ApiResponse::success(day))
}
