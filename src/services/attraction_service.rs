use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;

use super::notification_service::{NotificationEvent, NotificationService};
use super::transaction_service::{self, LedgerEntry};
use super::{parse_date, ServiceError};
use crate::database::manager::DatabaseManager;
use crate::database::models::Attraction;
use crate::types::TransactionType;

/// Highest value accepted for any single rating
pub const MAX_RATING: i32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttractionRequest {
    #[serde(default)]
    pub user_to: String,
    #[serde(default)]
    pub date: String,
    pub romantic_rating: Option<i32>,
    pub sexual_rating: Option<i32>,
    pub friendship_rating: Option<i32>,
    pub long_term_potential: Option<bool>,
    pub intellectual: Option<i32>,
    pub emotional: Option<i32>,
    /// Accepted for compatibility; whether tokens are charged is decided here
    pub is_update: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ratings {
    romantic: i32,
    sexual: i32,
    friendship: i32,
}

impl Ratings {
    fn from_request(request: &AttractionRequest) -> Result<Self, ServiceError> {
        let ratings = Self {
            romantic: request.romantic_rating.unwrap_or(0),
            sexual: request.sexual_rating.unwrap_or(0),
            friendship: request.friendship_rating.unwrap_or(0),
        };
        let values = [ratings.romantic, ratings.sexual, ratings.friendship];
        if values.iter().any(|r| *r < 0) {
            return Err(ServiceError::bad_request("Ratings must be non-negative integers."));
        }
        if values.iter().any(|r| *r > MAX_RATING) {
            return Err(ServiceError::bad_request(format!("Ratings cannot exceed {}.", MAX_RATING)));
        }
        Ok(ratings)
    }

    /// Bounded by `3 * MAX_RATING`, so it always fits a token amount
    fn total(&self) -> i32 {
        self.romantic + self.sexual + self.friendship
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttractionOutcome {
    pub message: String,
    pub attraction: Attraction,
    /// `None` until the other user has rated back
    #[serde(rename = "match")]
    pub is_match: Option<bool>,
    #[serde(skip)]
    pub created: bool,
}

/// Veto rule: any interest one side has in romance or sex must be shared,
/// and a friendship-only rating cancels a romantic or sexual one.
pub fn is_match(a: &Attraction, b: &Attraction) -> bool {
    let romantic = (a.romantic_rating > 0, b.romantic_rating > 0);
    let sexual = (a.sexual_rating > 0, b.sexual_rating > 0);

    if romantic.0 != romantic.1 || sexual.0 != sexual.1 {
        return false;
    }

    let friends_only = |x: &Attraction| x.romantic_rating == 0 && x.sexual_rating == 0 && x.friendship_rating > 0;
    let wants_more = |x: &Attraction| x.romantic_rating > 0 || x.sexual_rating > 0;

    !((friends_only(a) && wants_more(b)) || (friends_only(b) && wants_more(a)))
}

/// `(recipient, sender)` of a match proposal: the lower total receives it,
/// ties go to the counterpart who rated first.
pub fn match_proposal_roles<'a>(submitted: &'a Attraction, counterpart: &'a Attraction) -> (&'a str, &'a str) {
    if submitted.total_score() < counterpart.total_score() {
        (&submitted.user_from, &counterpart.user_from)
    } else {
        (&counterpart.user_from, &submitted.user_from)
    }
}

pub struct AttractionService {
    pool: PgPool,
}

impl AttractionService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self { pool })
    }

    /// Record (or revise) the caller's ratings and resolve the match if the
    /// other user has already rated back. New non-zero ratings cost tokens.
    pub async fn submit(&self, user_from: &str, request: AttractionRequest) -> Result<AttractionOutcome, ServiceError> {
        let user_to = request.user_to.trim().to_string();
        if user_to.is_empty() {
            return Err(ServiceError::bad_request("userTo is required."));
        }
        if user_to == user_from {
            return Err(ServiceError::bad_request("You cannot submit an attraction to yourself."));
        }
        let date = parse_date(&request.date)?;
        let ratings = Ratings::from_request(&request)?;

        let mut tx = self.pool.begin().await?;

        let target_exists: Option<(String,)> = sqlx::query_as("SELECT user_id FROM users WHERE user_id = $1")
            .bind(&user_to)
            .fetch_optional(&mut *tx)
            .await?;
        if target_exists.is_none() {
            return Err(ServiceError::not_found("User not found."));
        }

        let existing = find_for_update(&mut tx, user_from, &user_to, date).await?;
        let created = existing.is_none();

        let mut attraction = match existing {
            Some(existing) => {
                sqlx::query_as::<_, Attraction>(
                    r#"
                    UPDATE attractions
                    SET romantic_rating = $2, sexual_rating = $3, friendship_rating = $4,
                        long_term_potential = COALESCE($5, long_term_potential),
                        intellectual = COALESCE($6, intellectual),
                        emotional = COALESCE($7, emotional),
                        updated_at = NOW()
                    WHERE attraction_id = $1
                    RETURNING *
                    "#,
                )
                .bind(existing.attraction_id)
                .bind(ratings.romantic)
                .bind(ratings.sexual)
                .bind(ratings.friendship)
                .bind(request.long_term_potential)
                .bind(request.intellectual)
                .bind(request.emotional)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, Attraction>(
                    r#"
                    INSERT INTO attractions
                        (user_from, user_to, date, romantic_rating, sexual_rating, friendship_rating,
                         long_term_potential, intellectual, emotional)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING *
                    "#,
                )
                .bind(user_from)
                .bind(&user_to)
                .bind(date)
                .bind(ratings.romantic)
                .bind(ratings.sexual)
                .bind(ratings.friendship)
                .bind(request.long_term_potential)
                .bind(request.intellectual)
                .bind(request.emotional)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        if created && ratings.total() > 0 {
            let entry = LedgerEntry::new(TransactionType::Deduction, -ratings.total(), "Attraction submitted")
                .related_to("attraction", attraction.attraction_id.to_string());
            transaction_service::spend(&mut tx, user_from, ratings.total(), entry).await?;
        }

        let counterpart = find_for_update(&mut tx, &user_to, user_from, date).await?;
        let counterpart = match counterpart {
            Some(mut counterpart) => {
                let matched = is_match(&attraction, &counterpart);
                sqlx::query("UPDATE attractions SET result = $1, updated_at = NOW() WHERE attraction_id IN ($2, $3)")
                    .bind(matched)
                    .bind(attraction.attraction_id)
                    .bind(counterpart.attraction_id)
                    .execute(&mut *tx)
                    .await?;
                attraction.result = Some(matched);
                counterpart.result = Some(matched);
                Some(counterpart)
            }
            None => None,
        };

        tx.commit().await?;

        let is_match = attraction.result;
        info!(user_from, user_to = %user_to, %date, ?is_match, "attraction recorded");

        let notifications = NotificationService::for_pool(self.pool.clone());
        match counterpart {
            None => {
                notifications
                    .notify(NotificationEvent::AttractionProposal {
                        sender: user_from.to_string(),
                        receiver: user_to.clone(),
                        story_date: date,
                    })
                    .await
            }
            Some(counterpart) if is_match == Some(true) => {
                notifications
                    .notify(NotificationEvent::MatchProposal {
                        submitted: attraction.clone(),
                        counterpart,
                    })
                    .await
            }
            Some(_) => {}
        }

        let message = if created {
            "Attraction created successfully."
        } else {
            "Attraction updated successfully."
        };
        Ok(AttractionOutcome {
            message: message.to_string(),
            attraction,
            is_match,
            created,
        })
    }

    pub async fn get(&self, caller: &str, user_from: &str, user_to: &str, date: &str) -> Result<Attraction, ServiceError> {
        ensure_party(caller, user_from, user_to)?;
        let date = parse_date(date)?;

        sqlx::query_as::<_, Attraction>(
            "SELECT * FROM attractions WHERE user_from = $1 AND user_to = $2 AND date = $3",
        )
        .bind(user_from)
        .bind(user_to)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Attraction not found."))
    }

    /// Every rating `user_from` has given `user_to`, newest date first
    pub async fn list_between(&self, caller: &str, user_from: &str, user_to: &str) -> Result<Vec<Attraction>, ServiceError> {
        ensure_party(caller, user_from, user_to)?;

        let rows = sqlx::query_as::<_, Attraction>(
            "SELECT * FROM attractions WHERE user_from = $1 AND user_to = $2 ORDER BY date DESC",
        )
        .bind(user_from)
        .bind(user_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn ensure_party(caller: &str, user_from: &str, user_to: &str) -> Result<(), ServiceError> {
    if caller != user_from && caller != user_to {
        return Err(ServiceError::forbidden("You do not have permission to view this attraction."));
    }
    Ok(())
}

async fn find_for_update(
    conn: &mut PgConnection,
    user_from: &str,
    user_to: &str,
    date: NaiveDate,
) -> Result<Option<Attraction>, ServiceError> {
    let row = sqlx::query_as::<_, Attraction>(
        "SELECT * FROM attractions WHERE user_from = $1 AND user_to = $2 AND date = $3 FOR UPDATE",
    )
    .bind(user_from)
    .bind(user_to)
    .bind(date)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn rated(from: &str, r: i32, s: i32, f: i32) -> Attraction {
        Attraction {
            attraction_id: Uuid::new_v4(),
            user_from: from.to_string(),
            user_to: if from == "a" { "b" } else { "a" }.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            romantic_rating: r,
            sexual_rating: s,
            friendship_rating: f,
            long_term_potential: None,
            intellectual: None,
            emotional: None,
            result: None,
            first_message_rights: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn shared_interest_matches() {
        assert!(is_match(&rated("a", 2, 0, 1), &rated("b", 1, 0, 0)));
        assert!(is_match(&rated("a", 1, 3, 0), &rated("b", 2, 1, 2)));
        assert!(is_match(&rated("a", 0, 0, 3), &rated("b", 0, 0, 1)));
        assert!(is_match(&rated("a", 0, 0, 0), &rated("b", 0, 0, 0)));
    }

    #[test]
    fn one_sided_interest_is_vetoed() {
        assert!(!is_match(&rated("a", 2, 0, 0), &rated("b", 0, 0, 0)));
        assert!(!is_match(&rated("a", 1, 1, 0), &rated("b", 1, 0, 0)));
        assert!(!is_match(&rated("a", 0, 0, 2), &rated("b", 0, 2, 0)));
    }

    #[test]
    fn lower_total_receives_match_proposal() {
        let submitted = rated("a", 1, 0, 0);
        let counterpart = rated("b", 3, 0, 0);
        assert_eq!(match_proposal_roles(&submitted, &counterpart), ("a", "b"));

        let submitted = rated("a", 3, 1, 0);
        assert_eq!(match_proposal_roles(&submitted, &counterpart), ("b", "a"));
    }

    #[test]
    fn tie_goes_to_counterpart() {
        let submitted = rated("a", 2, 0, 0);
        let counterpart = rated("b", 1, 0, 1);
        assert_eq!(match_proposal_roles(&submitted, &counterpart), ("b", "a"));
    }

    #[test]
    fn ratings_default_to_zero_and_reject_negatives() {
        let request = AttractionRequest { romantic_rating: Some(2), ..Default::default() };
        let ratings = Ratings::from_request(&request).unwrap();
        assert_eq!(ratings.total(), 2);

        let negative = AttractionRequest { sexual_rating: Some(-1), ..Default::default() };
        assert!(Ratings::from_request(&negative).is_err());
    }

    #[test]
    fn oversized_ratings_are_rejected_before_summing() {
        let huge = AttractionRequest {
            romantic_rating: Some(i32::MAX),
            sexual_rating: Some(1),
            ..Default::default()
        };
        assert!(matches!(Ratings::from_request(&huge), Err(ServiceError::BadRequest(_))));

        let at_cap = AttractionRequest {
            romantic_rating: Some(MAX_RATING),
            sexual_rating: Some(MAX_RATING),
            friendship_rating: Some(MAX_RATING),
            ..Default::default()
        };
        assert_eq!(Ratings::from_request(&at_cap).unwrap().total(), 3 * MAX_RATING);
    }

    #[test]
    fn stored_extremes_compare_without_overflow() {
        let submitted = rated("a", i32::MAX, i32::MAX, 0);
        let counterpart = rated("b", 1, 0, 0);
        assert_eq!(submitted.total_score(), 2 * i64::from(i32::MAX));
        assert_eq!(match_proposal_roles(&submitted, &counterpart), ("b", "a"));
    }
}
