use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user's ratings of another for a single calendar date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub attraction_id: Uuid,
    pub user_from: String,
    pub user_to: String,
    pub date: NaiveDate,
    pub romantic_rating: i32,
    pub sexual_rating: i32,
    pub friendship_rating: i32,
    pub long_term_potential: Option<bool>,
    pub intellectual: Option<i32>,
    pub emotional: Option<i32>,
    /// Mutual-match outcome, set once both sides have rated
    pub result: Option<bool>,
    pub first_message_rights: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attraction {
    /// Widened so stored ratings can never overflow the sum
    pub fn total_score(&self) -> i64 {
        i64::from(self.romantic_rating) + i64::from(self.sexual_rating) + i64::from(self.friendship_rating)
    }
}
