// handlers/protected/attractions/attraction_post.rs - POST /api/attraction handler

use axum::Extension;

use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::attraction_service::{AttractionOutcome, AttractionRequest, AttractionService};

/// POST /api/attraction - rate another user's story for a day
///
/// Expected Input:
/// ```json
/// {
///   "userTo": "auth0|abc",
///   "date": "2024-06-21",
///   "romanticRating": 2,
///   "sexualRating": 0,
///   "friendshipRating": 1
/// }
/// ```
///
/// Responds with the stored attraction and `match` (null until the other
/// user has rated back). A first non-zero rating costs its total in tokens.
pub async fn attraction_post(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<AttractionRequest>,
) -> ApiResult<AttractionOutcome> {
    let outcome = AttractionService::new().await?.submit(&auth.user_id, request).await?;

    if outcome.created {
        Ok(ApiResponse::created(outcome))
    } else {
        Ok(ApiResponse::success(outcome))
    }
}
