// handlers/protected/videos/mod.rs - GET /api/videos/playable-url handler

use axum::extract::Query;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::parse_uuid;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::calendar_day_service::CalendarDayService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayableUrlQuery {
    pub uri: Option<String>,
    pub calendar_id: Option<String>,
}

/// Fresh streamable link for a Vimeo video, by URI or by calendar day
pub async fn playable_url_get(Query(query): Query<PlayableUrlQuery>) -> ApiResult<Value> {
    let calendar_id = query
        .calendar_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(|id| parse_uuid(id, "calendarId"))
        .transpose()?;

    let playable_url = CalendarDayService::new()
        .await?
        .playable_url(query.uri.as_deref(), calendar_id)
        .await?;
    Ok(ApiResponse::success(json!({ "playableUrl": playable_url })))
}
