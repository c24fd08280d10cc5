use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::ProcessingStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub calendar_id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub user_video_url: Option<String>,
    pub vimeo_uri: Option<String>,
    pub processing_status: Option<ProcessingStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Another user's finished story video near the caller
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub calendar_id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub vimeo_uri: String,
    pub processing_status: ProcessingStatus,
    pub user_name: String,
    pub profile_picture_url: Option<String>,
    pub zipcode: Option<String>,
    /// Miles from the caller
    #[serde(serialize_with = "two_decimals")]
    pub distance: f64,
    #[sqlx(default)]
    pub playable_url: Option<String>,
}

fn two_decimals<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}
