use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{DateOutcome, DateStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMetadata {
    pub name: Option<String>,
    pub address: Option<String>,
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DateEntry {
    pub date_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub user_from: String,
    pub user_to: String,
    pub user_from_approved: bool,
    pub user_to_approved: bool,
    pub location_metadata: Option<Json<LocationMetadata>>,
    pub status: DateStatus,
    pub conflicts_with_date_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DateEntry {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.user_from == user_id || self.user_to == user_id
    }

    /// The participant who is not `user_id`
    pub fn other_user(&self, user_id: &str) -> &str {
        if self.user_from == user_id {
            &self.user_to
        } else {
            &self.user_from
        }
    }

    pub fn venue_name(&self) -> Option<&str> {
        self.location_metadata
            .as_ref()
            .and_then(|meta| meta.0.name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}

/// A date with both participants' public profiles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDetails {
    #[serde(flatten)]
    pub date: DateEntry,
    pub user_from_details: super::PublicUser,
    pub user_to_details: super::PublicUser,
}

/// Row of the caller's upcoming-dates list
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDate {
    pub date_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: DateStatus,
    pub updated_at: DateTime<Utc>,
    pub conflicts_with_date_id: Option<Uuid>,
    pub location_metadata: Option<Json<LocationMetadata>>,
    pub user_from: String,
    pub user_to: String,
    pub user_from_approved: bool,
    pub user_to_approved: bool,
    pub my_outcome: Option<DateOutcome>,
    pub my_notes: Option<String>,
    pub other_user: Json<OtherUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherUser {
    pub user_id: String,
    pub first_name: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DateFeedback {
    pub date_id: Uuid,
    pub user_id: String,
    pub outcome: DateOutcome,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
