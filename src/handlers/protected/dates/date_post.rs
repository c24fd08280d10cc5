// handlers/protected/dates/date_post.rs - date proposal and conflict resolution handlers

use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::date_service::{ConflictResolutionRequest, DateProposal, DateService, Resolution};

/// POST /api/date - propose a date to another user
///
/// A proposal that lands on the recipient's confirmed date is stored as
/// `pending_conflict` for the recipient to resolve; one within 30 minutes of
/// either user's pending or confirmed date is rejected with 409.
pub async fn date_post(
    Extension(auth): Extension<AuthUser>,
    ApiJson(proposal): ApiJson<DateProposal>,
) -> ApiResult<Value> {
    let outcome = DateService::new().await?.propose(&auth.user_id, proposal).await?;

    let message = if outcome.conflict {
        "Date proposed. The other user has a conflicting date and must resolve it."
    } else {
        "Date proposed successfully."
    };
    Ok(ApiResponse::created(json!({
        "message": message,
        "date": outcome.date
    })))
}

/// POST /api/dates/resolve-conflict
pub async fn date_resolve_conflict(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<ConflictResolutionRequest>,
) -> ApiResult<Value> {
    let resolution = request.resolution;
    let (date, original_date) = DateService::new().await?.resolve_conflict(&auth.user_id, request).await?;

    let message = match resolution {
        Resolution::KeepOriginal => "Kept your original date; the new proposal was declined.",
        Resolution::AcceptNew => "Accepted the new date; the original date needs rescheduling.",
    };
    Ok(ApiResponse::success(json!({
        "message": message,
        "date": date,
        "originalDate": original_date
    })))
}
