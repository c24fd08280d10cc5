use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::attraction_service::match_proposal_roles;
use super::ServiceError;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Attraction, Notification, PublicUser};
use crate::integrations::push::{self, PushMessage, PushNotifier};
use crate::types::{NotificationStatus, NotificationType};

/// How a recipient answered a date proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateResponse {
    Accepted,
    Declined,
    /// Declined because the recipient kept a conflicting date
    DeclinedUnavailable,
}

#[derive(Debug, Clone)]
pub enum NotificationEvent {
    AttractionProposal { sender: String, receiver: String, story_date: NaiveDate },
    MatchProposal { submitted: Attraction, counterpart: Attraction },
    DateProposal { sender: String, receiver: String, date_id: Uuid, venue: String },
    DateResponse { responder: String, receiver: String, date_id: Uuid, response: DateResponse },
    DateRescheduled { updater: String, receiver: String, date_id: Uuid },
    DateCancelled { canceller: String, receiver: String, date_id: Uuid },
    DateConflict { sender: String, receiver: String, date_id: Uuid },
    DateNeedsRescheduling { sender: String, receiver: String, date_id: Uuid },
}

/// Rendered text and push data for one notification
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub kind: NotificationType,
    pub title: String,
    pub body: String,
    pub related_entity_id: String,
    pub data: BTreeMap<String, String>,
}

/// "October 15th"
pub fn format_month_day(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}", date.format("%B"), day, suffix)
}

fn display_name<'a>(first_name: Option<&'a str>, fallback: &'a str) -> &'a str {
    first_name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(fallback)
}

fn date_data(kind: NotificationType, date_id: Uuid) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("type".to_string(), kind.as_str().to_string()),
        ("dateId".to_string(), date_id.to_string()),
    ])
}

impl NotificationEvent {
    /// (recipient, sender) user ids
    pub fn parties(&self) -> (&str, &str) {
        match self {
            NotificationEvent::AttractionProposal { sender, receiver, .. }
            | NotificationEvent::DateProposal { sender, receiver, .. }
            | NotificationEvent::DateConflict { sender, receiver, .. }
            | NotificationEvent::DateNeedsRescheduling { sender, receiver, .. } => (receiver, sender),
            NotificationEvent::DateResponse { responder, receiver, .. } => (receiver, responder),
            NotificationEvent::DateRescheduled { updater, receiver, .. } => (receiver, updater),
            NotificationEvent::DateCancelled { canceller, receiver, .. } => (receiver, canceller),
            NotificationEvent::MatchProposal { submitted, counterpart } => match_proposal_roles(submitted, counterpart),
        }
    }

    /// Conflict notices are still delivered when the sender's profile is gone
    fn requires_sender_profile(&self) -> bool {
        !matches!(
            self,
            NotificationEvent::DateConflict { .. } | NotificationEvent::DateNeedsRescheduling { .. }
        )
    }

    pub fn content(&self, sender_first_name: Option<&str>) -> NotificationContent {
        let name = display_name(sender_first_name, "Someone");

        match self {
            NotificationEvent::AttractionProposal { sender, story_date, .. } => {
                let day = format_month_day(*story_date);
                let kind = NotificationType::AttractionProposal;
                let story_date = story_date.format("%Y-%m-%d").to_string();
                NotificationContent {
                    kind,
                    title: format!("Interest for your {} story", day),
                    body: format!(
                        "Someone wants to meet you on {}. Did you see anyone on that date you want to meet?",
                        day
                    ),
                    related_entity_id: story_date.clone(),
                    data: BTreeMap::from([
                        ("type".to_string(), kind.as_str().to_string()),
                        ("storyDate".to_string(), story_date),
                        ("senderUserId".to_string(), sender.clone()),
                    ]),
                }
            }
            NotificationEvent::MatchProposal { submitted, .. } => {
                let kind = NotificationType::MatchProposal;
                let (_, sender) = self.parties();
                let date = submitted.date.format("%Y-%m-%d").to_string();
                NotificationContent {
                    kind,
                    title: "It’s a Match! 🎉".to_string(),
                    body: "They feel the same. Does their Plan work for you to meet in real life?".to_string(),
                    related_entity_id: date.clone(),
                    data: BTreeMap::from([
                        ("type".to_string(), kind.as_str().to_string()),
                        ("dateForProposal".to_string(), date),
                        ("userToId".to_string(), sender.to_string()),
                    ]),
                }
            }
            NotificationEvent::DateProposal { date_id, venue, .. } => {
                let kind = NotificationType::DateProposal;
                NotificationContent {
                    kind,
                    title: "New Date Proposal! ✨".to_string(),
                    body: format!("{} proposed a date at {}. Tap to see details!", name, venue),
                    related_entity_id: date_id.to_string(),
                    data: date_data(kind, *date_id),
                }
            }
            NotificationEvent::DateResponse { date_id, response, .. } => {
                let (kind, title, body) = match response {
                    DateResponse::Accepted => (
                        NotificationType::DateApproved,
                        "Date Confirmed! 🎉",
                        format!("{} has accepted your date proposal!", name),
                    ),
                    DateResponse::Declined => (
                        NotificationType::DateDeclined,
                        "Date Update",
                        format!("{} has declined the proposed date.", name),
                    ),
                    DateResponse::DeclinedUnavailable => (
                        NotificationType::DateDeclined,
                        "Date Update",
                        format!("Sorry, {} is unavailable at that time. Please suggest another time!", name),
                    ),
                };
                NotificationContent {
                    kind,
                    title: title.to_string(),
                    body,
                    related_entity_id: date_id.to_string(),
                    data: date_data(kind, *date_id),
                }
            }
            NotificationEvent::DateRescheduled { date_id, .. } => {
                let kind = NotificationType::DateRescheduled;
                NotificationContent {
                    kind,
                    title: "🗓️ Date Rescheduled".to_string(),
                    body: format!("{} has rescheduled your date. Tap to see the new details.", name),
                    related_entity_id: date_id.to_string(),
                    data: date_data(kind, *date_id),
                }
            }
            NotificationEvent::DateCancelled { date_id, .. } => {
                let kind = NotificationType::DateCancelled;
                NotificationContent {
                    kind,
                    title: "😟 Date Cancelled".to_string(),
                    body: format!("{} has cancelled your upcoming date.", name),
                    related_entity_id: date_id.to_string(),
                    data: date_data(kind, *date_id),
                }
            }
            NotificationEvent::DateConflict { date_id, .. } => {
                let kind = NotificationType::DateConflict;
                NotificationContent {
                    kind,
                    title: "You have a scheduling conflict!".to_string(),
                    body: format!(
                        "{} has proposed a date at a time you're already busy. Check your calendar to resolve it!",
                        name
                    ),
                    related_entity_id: date_id.to_string(),
                    data: date_data(kind, *date_id),
                }
            }
            NotificationEvent::DateNeedsRescheduling { date_id, .. } => {
                let kind = NotificationType::DateNeedsRescheduling;
                NotificationContent {
                    kind,
                    title: "A date needs to be rescheduled".to_string(),
                    body: format!(
                        "Your date with {} needs to be rescheduled. Please check your chat to find a new time.",
                        display_name(sender_first_name, "a user")
                    ),
                    related_entity_id: date_id.to_string(),
                    data: date_data(kind, *date_id),
                }
            }
        }
    }
}

pub struct NotificationService {
    pool: PgPool,
    notifier: Arc<dyn PushNotifier>,
}

impl NotificationService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self::for_pool(pool))
    }

    /// Uses the process-wide push notifier
    pub fn for_pool(pool: PgPool) -> Self {
        Self::with_notifier(pool, push::notifier())
    }

    pub fn with_notifier(pool: PgPool, notifier: Arc<dyn PushNotifier>) -> Self {
        Self { pool, notifier }
    }

    /// Store the notification and push it to the recipient's device
    pub async fn dispatch(&self, event: NotificationEvent) -> Result<(), ServiceError> {
        let (recipient, sender) = event.parties();

        let sender_profile = sqlx::query_as::<_, PublicUser>(
            "SELECT user_id, first_name, last_name, profile_picture_url, video_url FROM users WHERE user_id = $1",
        )
        .bind(sender)
        .fetch_optional(&self.pool)
        .await?;

        if sender_profile.is_none() && event.requires_sender_profile() {
            debug!("Sender {} no longer exists, skipping notification", sender);
            return Ok(());
        }

        let target: Option<(Option<String>, bool)> =
            sqlx::query_as("SELECT push_token, enable_notifications FROM users WHERE user_id = $1")
                .bind(recipient)
                .fetch_optional(&self.pool)
                .await?;
        let Some((push_token, enabled)) = target else {
            debug!("Recipient {} no longer exists, skipping notification", recipient);
            return Ok(());
        };

        let content = event.content(sender_profile.as_ref().and_then(|p| p.first_name.as_deref()));

        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, message, type, status, related_entity_id, proposing_user_id)
            VALUES ($1, $2, $3, 'unread', $4, $5)
            "#,
        )
        .bind(recipient)
        .bind(&content.body)
        .bind(content.kind.as_str())
        .bind(&content.related_entity_id)
        .bind(sender_profile.as_ref().map(|p| p.user_id.as_str()))
        .execute(&self.pool)
        .await?;

        match push_token.filter(|_| enabled) {
            Some(device_token) => {
                let message = PushMessage {
                    device_token,
                    title: content.title,
                    body: content.body,
                    image_url: sender_profile.and_then(|p| p.profile_picture_url),
                    data: content.data,
                };
                if let Err(e) = self.notifier.send(&message).await {
                    warn!("Push '{}' to {} failed: {}", content.kind, recipient, e);
                }
            }
            None => debug!("No push target for {} ({})", recipient, content.kind),
        }

        Ok(())
    }

    /// Fire-and-forget variant for use after a commit; failures are only logged
    pub async fn notify(&self, event: NotificationEvent) {
        let kind = event.content(None).kind;
        if let Err(e) = self.dispatch(event).await {
            warn!("Failed to deliver {} notification: {}", kind, e);
        }
    }

    /// Newest unread notifications, or the newest read ones when nothing is unread
    pub async fn list(&self, user_id: &str, page_size: i64) -> Result<Vec<Notification>, ServiceError> {
        let unread = self.by_status(user_id, NotificationStatus::Unread, page_size).await?;
        if !unread.is_empty() {
            return Ok(unread);
        }
        self.by_status(user_id, NotificationStatus::Read, page_size).await
    }

    async fn by_status(
        &self,
        user_id: &str,
        status: NotificationStatus,
        limit: i64,
    ) -> Result<Vec<Notification>, ServiceError> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND status = $2 ORDER BY created_at DESC LIMIT $3",
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<i64, ServiceError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND status = 'unread'")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64, ServiceError> {
        let result = sqlx::query("UPDATE notifications SET status = 'read' WHERE user_id = $1 AND status = 'unread'")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
