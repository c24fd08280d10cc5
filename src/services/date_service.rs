use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::notification_service::{DateResponse, NotificationEvent, NotificationService};
use super::{parse_date, parse_time, ServiceError};
use crate::database::manager::DatabaseManager;
use crate::database::models::{DateDetails, DateEntry, DateFeedback, LocationMetadata, PublicUser, UpcomingDate};
use crate::types::{DateOutcome, DateStatus};

/// Two dates closer than this on the same day collide
const CONFLICT_WINDOW_SECONDS: i32 = 30 * 60;

const DEFAULT_VENUE: &str = "A new spot!";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateProposal {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub user_to: String,
    pub location_metadata: Option<LocationMetadata>,
    pub romantic_rating: Option<i32>,
    pub sexual_rating: Option<i32>,
    pub friendship_rating: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateUpdate {
    pub date: Option<String>,
    pub time: Option<String>,
    pub location_metadata: Option<LocationMetadata>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub outcome: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    KeepOriginal,
    AcceptNew,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolutionRequest {
    pub date_id: Uuid,
    pub conflicting_date_id: Uuid,
    pub resolution: Resolution,
}

#[derive(Debug, Clone)]
pub struct ProposalOutcome {
    pub date: DateEntry,
    /// The recipient already had an approved date at that exact time
    pub conflict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Rescheduled,
    Responded(DateResponse),
}

/// Column values a PATCH on a date resolves to
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location_metadata: Option<LocationMetadata>,
    pub status: DateStatus,
    pub user_from_approved: bool,
    pub user_to_approved: bool,
    pub kind: UpdateKind,
}

/// Decide what a participant's update does to the date. Any date, time or
/// location field makes it a reschedule; otherwise `status` must be an
/// approve/decline response.
pub fn plan_update(entry: &DateEntry, updater: &str, update: &DateUpdate) -> Result<PlannedUpdate, ServiceError> {
    let is_from = entry.user_from == updater;
    let reschedule = update.date.is_some() || update.time.is_some() || update.location_metadata.is_some();

    if reschedule {
        if !entry.status.is_reschedulable() {
            return Err(ServiceError::bad_request(format!(
                "A date with status '{}' cannot be rescheduled.",
                status_name(entry.status)
            )));
        }
        let date = update.date.as_deref().map(parse_date).transpose()?.unwrap_or(entry.date);
        let time = update.time.as_deref().map(parse_time).transpose()?.unwrap_or(entry.time);
        let location_metadata = update
            .location_metadata
            .clone()
            .or_else(|| entry.location_metadata.as_ref().map(|meta| meta.0.clone()));

        return Ok(PlannedUpdate {
            date,
            time,
            location_metadata,
            status: DateStatus::Pending,
            user_from_approved: is_from,
            user_to_approved: !is_from,
            kind: UpdateKind::Rescheduled,
        });
    }

    let approve = match update.status.as_deref() {
        Some("approved") => true,
        Some("declined") => false,
        _ => return Err(ServiceError::bad_request("No valid update data provided.")),
    };

    if entry.status != DateStatus::Pending {
        return Err(ServiceError::bad_request("This date is not awaiting a response."));
    }
    let already_approved = if is_from { entry.user_from_approved } else { entry.user_to_approved };
    if already_approved {
        return Err(ServiceError::forbidden("It's not your turn to respond."));
    }

    let mut planned = PlannedUpdate {
        date: entry.date,
        time: entry.time,
        location_metadata: entry.location_metadata.as_ref().map(|meta| meta.0.clone()),
        status: entry.status,
        user_from_approved: entry.user_from_approved,
        user_to_approved: entry.user_to_approved,
        kind: UpdateKind::Responded(DateResponse::Declined),
    };

    if approve {
        if is_from {
            planned.user_from_approved = true;
        } else {
            planned.user_to_approved = true;
        }
        if planned.user_from_approved && planned.user_to_approved {
            planned.status = DateStatus::Approved;
        }
        planned.kind = UpdateKind::Responded(DateResponse::Accepted);
    } else {
        planned.status = DateStatus::Declined;
    }

    Ok(planned)
}

fn status_name(status: DateStatus) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub struct DateService {
    pool: PgPool,
}

impl DateService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self { pool })
    }

    fn notifications(&self) -> NotificationService {
        NotificationService::for_pool(self.pool.clone())
    }

    pub async fn propose(&self, proposer: &str, proposal: DateProposal) -> Result<ProposalOutcome, ServiceError> {
        if proposal.date.trim().is_empty() || proposal.time.trim().is_empty() || proposal.user_to.trim().is_empty() {
            return Err(ServiceError::bad_request("date, time and userTo are required."));
        }
        if proposal.romantic_rating.is_none() || proposal.sexual_rating.is_none() || proposal.friendship_rating.is_none()
        {
            return Err(ServiceError::bad_request(
                "romanticRating, sexualRating and friendshipRating must be numbers.",
            ));
        }
        let user_to = proposal.user_to.trim().to_string();
        if user_to == proposer {
            return Err(ServiceError::bad_request("You cannot propose a date to yourself."));
        }
        let date = parse_date(&proposal.date)?;
        let time = parse_time(&proposal.time)?;

        let venue = proposal
            .location_metadata
            .as_ref()
            .and_then(|meta| meta.name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_VENUE)
            .to_string();
        let location = proposal.location_metadata.map(Json);

        let mut tx = self.pool.begin().await?;

        // Both users stay locked until commit so concurrent proposals for
        // either of them see each other's rows
        let locked = lock_users(&mut tx, proposer, &user_to).await?;
        if !locked.iter().any(|id| *id == user_to) {
            return Err(ServiceError::not_found("User not found."));
        }

        let existing = sqlx::query_as::<_, DateEntry>(
            r#"
            SELECT * FROM dates
            WHERE ((user_from = $1 AND user_to = $2) OR (user_from = $2 AND user_to = $1))
              AND date = $3 AND status NOT IN ('cancelled', 'completed')
            LIMIT 1
            "#,
        )
        .bind(proposer)
        .bind(&user_to)
        .bind(date)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(existing) = existing {
            return Err(ServiceError::Conflict {
                message: "A date already exists between you and this user on that day.".to_string(),
                code: None,
                details: Some(json!({ "existingDate": existing })),
            });
        }

        let busy: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT date_id FROM dates
            WHERE (user_from = $1 OR user_to = $1) AND date = $2 AND time = $3 AND status = 'approved'
            LIMIT 1
            "#,
        )
        .bind(&user_to)
        .bind(date)
        .bind(time)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((conflicting_id,)) = busy {
            let entry = insert_date(
                &mut tx,
                NewDate {
                    date,
                    time,
                    user_from: proposer,
                    user_to: &user_to,
                    location,
                    status: DateStatus::PendingConflict,
                    conflicts_with: Some(conflicting_id),
                },
            )
            .await?;
            tx.commit().await?;

            info!(date_id = %entry.date_id, %conflicting_id, "date proposed over an approved date");
            self.notifications()
                .notify(NotificationEvent::DateConflict {
                    sender: proposer.to_string(),
                    receiver: user_to,
                    date_id: entry.date_id,
                })
                .await;
            return Ok(ProposalOutcome { date: entry, conflict: true });
        }

        let nearby: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT date_id FROM dates
            WHERE (user_from IN ($1, $2) OR user_to IN ($1, $2))
              AND date = $3
              AND status IN ('pending', 'approved')
              AND ABS(EXTRACT(EPOCH FROM (time - $4::time))) <= $5
            LIMIT 1
            "#,
        )
        .bind(proposer)
        .bind(&user_to)
        .bind(date)
        .bind(time)
        .bind(CONFLICT_WINDOW_SECONDS)
        .fetch_optional(&mut *tx)
        .await?;
        if nearby.is_some() {
            return Err(ServiceError::scheduling_conflict(
                "You or the other user already have a date within 30 minutes of this time.",
            ));
        }

        let entry = insert_date(
            &mut tx,
            NewDate {
                date,
                time,
                user_from: proposer,
                user_to: &user_to,
                location,
                status: DateStatus::Pending,
                conflicts_with: None,
            },
        )
        .await?;
        tx.commit().await?;

        info!(date_id = %entry.date_id, "date proposed");
        self.notifications()
            .notify(NotificationEvent::DateProposal {
                sender: proposer.to_string(),
                receiver: user_to,
                date_id: entry.date_id,
                venue,
            })
            .await;

        Ok(ProposalOutcome { date: entry, conflict: false })
    }

    pub async fn update(&self, updater: &str, date_id: Uuid, update: DateUpdate) -> Result<DateEntry, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let entry = lock_date(&mut tx, date_id).await?;
        if !entry.is_participant(updater) {
            return Err(ServiceError::forbidden("You are not a participant in this date."));
        }

        let planned = plan_update(&entry, updater, &update)?;

        if planned.kind == UpdateKind::Rescheduled {
            let collision: Option<(Uuid,)> = sqlx::query_as(
                r#"
                SELECT date_id FROM dates
                WHERE date_id <> $1
                  AND (user_from IN ($2, $3) OR user_to IN ($2, $3))
                  AND date = $4 AND time = $5 AND status = 'approved'
                LIMIT 1
                "#,
            )
            .bind(date_id)
            .bind(&entry.user_from)
            .bind(&entry.user_to)
            .bind(planned.date)
            .bind(planned.time)
            .fetch_optional(&mut *tx)
            .await?;
            if collision.is_some() {
                return Err(ServiceError::scheduling_conflict(
                    "One of you already has a confirmed date at that time.",
                ));
            }
        }

        let updated = sqlx::query_as::<_, DateEntry>(
            r#"
            UPDATE dates
            SET date = $2, time = $3, location_metadata = $4, status = $5,
                user_from_approved = $6, user_to_approved = $7, updated_at = NOW()
            WHERE date_id = $1
            RETURNING *
            "#,
        )
        .bind(date_id)
        .bind(planned.date)
        .bind(planned.time)
        .bind(planned.location_metadata.map(Json))
        .bind(planned.status)
        .bind(planned.user_from_approved)
        .bind(planned.user_to_approved)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let receiver = entry.other_user(updater).to_string();
        let event = match planned.kind {
            UpdateKind::Rescheduled => NotificationEvent::DateRescheduled {
                updater: updater.to_string(),
                receiver,
                date_id,
            },
            UpdateKind::Responded(response) => NotificationEvent::DateResponse {
                responder: updater.to_string(),
                receiver,
                date_id,
                response,
            },
        };
        info!(%date_id, status = ?updated.status, "date updated");
        self.notifications().notify(event).await;

        Ok(updated)
    }

    pub async fn cancel(&self, user_id: &str, date_id: Uuid) -> Result<DateEntry, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let entry = lock_date(&mut tx, date_id).await?;
        if !entry.is_participant(user_id) {
            return Err(ServiceError::forbidden("You are not a participant in this date."));
        }
        if entry.status.is_closed() {
            return Err(ServiceError::bad_request(format!(
                "This date is already {}.",
                status_name(entry.status)
            )));
        }

        let cancelled = sqlx::query_as::<_, DateEntry>(
            "UPDATE dates SET status = 'cancelled', updated_at = NOW() WHERE date_id = $1 RETURNING *",
        )
        .bind(date_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(%date_id, user_id, "date cancelled");
        self.notifications()
            .notify(NotificationEvent::DateCancelled {
                canceller: user_id.to_string(),
                receiver: entry.other_user(user_id).to_string(),
                date_id,
            })
            .await;
        Ok(cancelled)
    }

    pub async fn record_feedback(
        &self,
        user_id: &str,
        date_id: Uuid,
        request: FeedbackRequest,
    ) -> Result<DateFeedback, ServiceError> {
        let outcome: DateOutcome = request.outcome.parse().map_err(ServiceError::bad_request)?;
        let entry = self.find(date_id).await?.ok_or_else(|| ServiceError::not_found("Date not found."))?;
        if !entry.is_participant(user_id) {
            return Err(ServiceError::forbidden("You are not a participant in this date."));
        }

        let feedback = sqlx::query_as::<_, DateFeedback>(
            r#"
            INSERT INTO date_feedback (date_id, user_id, outcome, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (date_id, user_id)
            DO UPDATE SET outcome = EXCLUDED.outcome, notes = EXCLUDED.notes, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(date_id)
        .bind(user_id)
        .bind(outcome)
        .bind(&request.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(feedback)
    }

    /// A date with both profiles; hidden from non-participants
    pub async fn details(&self, user_id: &str, date_id: Uuid) -> Result<DateDetails, ServiceError> {
        let entry = self
            .find(date_id)
            .await?
            .filter(|entry| entry.is_participant(user_id))
            .ok_or_else(|| ServiceError::not_found("Date not found."))?;

        let profiles = sqlx::query_as::<_, PublicUser>(
            "SELECT user_id, first_name, last_name, profile_picture_url, video_url FROM users WHERE user_id IN ($1, $2)",
        )
        .bind(&entry.user_from)
        .bind(&entry.user_to)
        .fetch_all(&self.pool)
        .await?;

        let profile = |id: &str| {
            profiles
                .iter()
                .find(|p| p.user_id == id)
                .cloned()
                .ok_or_else(|| ServiceError::not_found("Date participant not found."))
        };
        let user_from_details = profile(&entry.user_from)?;
        let user_to_details = profile(&entry.user_to)?;

        Ok(DateDetails {
            date: entry,
            user_from_details,
            user_to_details,
        })
    }

    pub async fn upcoming(&self, user_id: &str) -> Result<Vec<UpcomingDate>, ServiceError> {
        let rows = sqlx::query_as::<_, UpcomingDate>(
            r#"
            SELECT d.date_id, d.date, d.time, d.status, d.updated_at, d.conflicts_with_date_id,
                   d.location_metadata, d.user_from, d.user_to, d.user_from_approved, d.user_to_approved,
                   f.outcome AS my_outcome, f.notes AS my_notes,
                   json_build_object(
                       'userId', u.user_id,
                       'firstName', u.first_name,
                       'profilePictureUrl', u.profile_picture_url
                   ) AS other_user
            FROM dates d
            JOIN users u ON u.user_id = CASE WHEN d.user_from = $1 THEN d.user_to ELSE d.user_from END
            LEFT JOIN date_feedback f ON f.date_id = d.date_id AND f.user_id = $1
            WHERE (d.user_from = $1 OR d.user_to = $1)
              AND d.status NOT IN ('cancelled', 'declined', 'completed')
            ORDER BY d.date DESC, d.time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The most recent date between two users on a day, in either direction
    pub async fn between(
        &self,
        caller: &str,
        user_from: &str,
        user_to: &str,
        date: &str,
    ) -> Result<DateEntry, ServiceError> {
        if caller != user_from && caller != user_to {
            return Err(ServiceError::forbidden("You do not have permission to view this date."));
        }
        let date = parse_date(date)?;

        sqlx::query_as::<_, DateEntry>(
            r#"
            SELECT * FROM dates
            WHERE ((user_from = $1 AND user_to = $2) OR (user_from = $2 AND user_to = $1)) AND date = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_from)
        .bind(user_to)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Date not found."))
    }

    /// Settle a proposal that landed on top of an approved date.
    /// Returns `(new_date, original_date)` after the change.
    pub async fn resolve_conflict(
        &self,
        resolver: &str,
        request: ConflictResolutionRequest,
    ) -> Result<(DateEntry, DateEntry), ServiceError> {
        let mut tx = self.pool.begin().await?;
        let proposed = lock_date(&mut tx, request.date_id).await?;
        let original = lock_date(&mut tx, request.conflicting_date_id).await?;

        if proposed.user_to != resolver || !original.is_participant(resolver) {
            return Err(ServiceError::forbidden("You are not allowed to resolve this conflict."));
        }
        if proposed.status != DateStatus::PendingConflict {
            return Err(ServiceError::bad_request("This date has no pending conflict."));
        }

        let (proposed, original, events) = match request.resolution {
            Resolution::KeepOriginal => {
                let declined = set_status(&mut tx, proposed.date_id, DateStatus::Declined, None).await?;
                let events = vec![NotificationEvent::DateResponse {
                    responder: resolver.to_string(),
                    receiver: proposed.user_from.clone(),
                    date_id: proposed.date_id,
                    response: DateResponse::DeclinedUnavailable,
                }];
                (declined, original, events)
            }
            Resolution::AcceptNew => {
                let displaced =
                    set_status(&mut tx, original.date_id, DateStatus::NeedsRescheduling, None).await?;
                let accepted = set_status(&mut tx, proposed.date_id, DateStatus::Approved, Some(true)).await?;
                let events = vec![
                    NotificationEvent::DateNeedsRescheduling {
                        sender: resolver.to_string(),
                        receiver: original.other_user(resolver).to_string(),
                        date_id: original.date_id,
                    },
                    NotificationEvent::DateResponse {
                        responder: resolver.to_string(),
                        receiver: proposed.user_from.clone(),
                        date_id: proposed.date_id,
                        response: DateResponse::Accepted,
                    },
                ];
                (accepted, displaced, events)
            }
        };
        tx.commit().await?;

        info!(date_id = %proposed.date_id, resolution = ?request.resolution, "date conflict resolved");
        let notifications = self.notifications();
        for event in events {
            notifications.notify(event).await;
        }

        Ok((proposed, original))
    }

    async fn find(&self, date_id: Uuid) -> Result<Option<DateEntry>, ServiceError> {
        let entry = sqlx::query_as::<_, DateEntry>("SELECT * FROM dates WHERE date_id = $1")
            .bind(date_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }
}

struct NewDate<'a> {
    date: NaiveDate,
    time: NaiveTime,
    user_from: &'a str,
    user_to: &'a str,
    location: Option<Json<LocationMetadata>>,
    status: DateStatus,
    conflicts_with: Option<Uuid>,
}

async fn insert_date(conn: &mut PgConnection, new: NewDate<'_>) -> Result<DateEntry, ServiceError> {
    let entry = sqlx::query_as::<_, DateEntry>(
        r#"
        INSERT INTO dates
            (date, time, user_from, user_to, user_from_approved, user_to_approved,
             location_metadata, status, conflicts_with_date_id)
        VALUES ($1, $2, $3, $4, TRUE, FALSE, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(new.date)
    .bind(new.time)
    .bind(new.user_from)
    .bind(new.user_to)
    .bind(new.location)
    .bind(new.status)
    .bind(new.conflicts_with)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

async fn lock_date(conn: &mut PgConnection, date_id: Uuid) -> Result<DateEntry, ServiceError> {
    sqlx::query_as::<_, DateEntry>("SELECT * FROM dates WHERE date_id = $1 FOR UPDATE")
        .bind(date_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Date not found."))
}

/// Set a status and clear any conflict link; `user_to_approved` is only
/// touched when given.
async fn set_status(
    conn: &mut PgConnection,
    date_id: Uuid,
    status: DateStatus,
    user_to_approved: Option<bool>,
) -> Result<DateEntry, ServiceError> {
    let entry = sqlx::query_as::<_, DateEntry>(
        r#"
        UPDATE dates
        SET status = $2, conflicts_with_date_id = NULL,
            user_to_approved = COALESCE($3, user_to_approved), updated_at = NOW()
        WHERE date_id = $1
        RETURNING *
        "#,
    )
    .bind(date_id)
    .bind(status)
    .bind(user_to_approved)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Ids in the order rows are locked, so two transactions over the same pair
/// never wait on each other crosswise
fn lock_order<'a>(a: &'a str, b: &'a str) -> [&'a str; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// `SELECT … FOR UPDATE` both users; returns the ids that exist
async fn lock_users(conn: &mut PgConnection, a: &str, b: &str) -> Result<Vec<String>, ServiceError> {
    let mut found = Vec::with_capacity(2);
    for user_id in lock_order(a, b) {
        let row: Option<(String,)> = sqlx::query_as("SELECT user_id FROM users WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        found.extend(row.map(|(id,)| id));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(status: DateStatus, from_approved: bool, to_approved: bool) -> DateEntry {
        DateEntry {
            date_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
            time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            user_from: "alice".to_string(),
            user_to: "bob".to_string(),
            user_from_approved: from_approved,
            user_to_approved: to_approved,
            location_metadata: Some(Json(LocationMetadata {
                name: Some("Cafe Luna".to_string()),
                ..Default::default()
            })),
            status,
            conflicts_with_date_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn respond(status: &str) -> DateUpdate {
        DateUpdate { status: Some(status.to_string()), ..Default::default() }
    }

    #[test]
    fn pair_locks_in_the_same_order_from_either_side() {
        assert_eq!(lock_order("auth0|b", "auth0|a"), ["auth0|a", "auth0|b"]);
        assert_eq!(lock_order("auth0|a", "auth0|b"), lock_order("auth0|b", "auth0|a"));
    }

    #[test]
    fn recipient_approval_confirms_date() {
        let planned = plan_update(&entry(DateStatus::Pending, true, false), "bob", &respond("approved")).unwrap();
        assert_eq!(planned.status, DateStatus::Approved);
        assert!(planned.user_to_approved);
        assert_eq!(planned.kind, UpdateKind::Responded(DateResponse::Accepted));
    }

    #[test]
    fn decline_closes_pending_date() {
        let planned = plan_update(&entry(DateStatus::Pending, true, false), "bob", &respond("declined")).unwrap();
        assert_eq!(planned.status, DateStatus::Declined);
        assert_eq!(planned.kind, UpdateKind::Responded(DateResponse::Declined));
    }

    #[test]
    fn proposer_cannot_respond_to_own_proposal() {
        let err = plan_update(&entry(DateStatus::Pending, true, false), "alice", &respond("approved")).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "It's not your turn to respond."));
    }

    #[test]
    fn responses_need_a_pending_date() {
        let err = plan_update(&entry(DateStatus::Approved, true, true), "bob", &respond("declined")).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[test]
    fn reschedule_resets_approvals_to_updater() {
        let update = DateUpdate { time: Some("20:30".to_string()), ..Default::default() };
        let planned = plan_update(&entry(DateStatus::Approved, true, true), "bob", &update).unwrap();
        assert_eq!(planned.status, DateStatus::Pending);
        assert_eq!(planned.time, NaiveTime::from_hms_opt(20, 30, 0).unwrap());
        assert_eq!(planned.date, NaiveDate::from_ymd_opt(2024, 7, 4).unwrap());
        assert!(!planned.user_from_approved);
        assert!(planned.user_to_approved);
        assert_eq!(planned.location_metadata.and_then(|m| m.name).as_deref(), Some("Cafe Luna"));
        assert_eq!(planned.kind, UpdateKind::Rescheduled);
    }

    #[test]
    fn closed_dates_cannot_be_rescheduled() {
        let update = DateUpdate { date: Some("2024-07-05".to_string()), ..Default::default() };
        for status in [DateStatus::Cancelled, DateStatus::Declined, DateStatus::PendingConflict] {
            assert!(plan_update(&entry(status, true, false), "alice", &update).is_err());
        }
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = plan_update(&entry(DateStatus::Pending, true, false), "bob", &DateUpdate::default()).unwrap_err();
        assert_eq!(err.to_string(), "No valid update data provided.");
        assert!(plan_update(&entry(DateStatus::Pending, true, false), "bob", &respond("maybe")).is_err());
    }

    #[test]
    fn resolution_parses_wire_names() {
        let request: ConflictResolutionRequest = serde_json::from_value(json!({
            "dateId": Uuid::nil(),
            "conflictingDateId": Uuid::nil(),
            "resolution": "ACCEPT_NEW"
        }))
        .unwrap();
        assert_eq!(request.resolution, Resolution::AcceptNew);
    }
}
