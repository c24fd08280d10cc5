// handlers/protected/attractions/attraction_get.rs - attraction lookup handlers

use axum::{extract::Path, Extension};

use crate::database::models::Attraction;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::attraction_service::AttractionService;

/// GET /api/attraction/:userFrom/:userTo/:date
pub async fn attraction_get(
    Extension(auth): Extension<AuthUser>,
    Path((user_from, user_to, date)): Path<(String, String, String)>,
) -> ApiResult<Attraction> {
    let attraction = AttractionService::new()
        .await?
        .get(&auth.user_id, &user_from, &user_to, &date)
        .await?;
    Ok(ApiResponse::success(attraction))
}

/// GET /api/attractions/:userFrom/:userTo - every day `userFrom` rated `userTo`
pub async fn attractions_between(
    Extension(auth): Extension<AuthUser>,
    Path((user_from, user_to)): Path<(String, String)>,
) -> ApiResult<Vec<Attraction>> {
    let attractions = AttractionService::new()
        .await?
        .list_between(&auth.user_id, &user_from, &user_to)
        .await?;
    Ok(ApiResponse::success(attractions))
}
