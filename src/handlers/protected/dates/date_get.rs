// handlers/protected/dates/date_get.rs - date lookup handlers

use axum::{extract::Path, Extension};

use crate::database::models::{DateDetails, DateEntry, UpcomingDate};
use crate::handlers::parse_uuid;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::date_service::DateService;

/// GET /api/dates/:dateId - date with both participants' profiles
pub async fn date_get(Extension(auth): Extension<AuthUser>, Path(date_id): Path<String>) -> ApiResult<DateDetails> {
    let date_id = parse_uuid(&date_id, "date id")?;
    let details = DateService::new().await?.details(&auth.user_id, date_id).await?;
    Ok(ApiResponse::success(details))
}

/// GET /api/dates/me/upcoming
pub async fn dates_upcoming(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<UpcomingDate>> {
    let dates = DateService::new().await?.upcoming(&auth.user_id).await?;
    Ok(ApiResponse::success(dates))
}

/// GET /api/date/:userFrom/:userTo/:date - the pair's date on a day, either direction
pub async fn date_between(
    Extension(auth): Extension<AuthUser>,
    Path((user_from, user_to, date)): Path<(String, String, String)>,
) -> ApiResult<DateEntry> {
    let entry = DateService::new()
        .await?
        .between(&auth.user_id, &user_from, &user_to, &date)
        .await?;
    Ok(ApiResponse::success(entry))
}
