use serde::Deserialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use super::transaction_service::{self, LedgerEntry};
use super::{is_unique_violation, zipcode_service, ServiceError};
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{PublicUser, User};
use crate::database::query_builder::UpdateBuilder;
use crate::types::TransactionType;

/// Profile fields supplied when a user first signs in
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub zipcode: Option<String>,
}

/// Client-editable profile fields; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub zipcode: Option<String>,
    pub stickers: Option<Value>,
    pub enable_notifications: Option<bool>,
    pub is_profile_complete: Option<bool>,
    pub video_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub referral_source: Option<String>,
    pub has_seen_calendar_tutorial: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.zipcode.is_none()
            && self.stickers.is_none()
            && self.enable_notifications.is_none()
            && self.is_profile_complete.is_none()
            && self.video_url.is_none()
            && self.profile_picture_url.is_none()
            && self.referral_source.is_none()
            && self.has_seen_calendar_tutorial.is_none()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// The referral bonus is paid once, the first time a source is recorded
fn earns_referral_bonus(current: Option<&str>, requested: Option<&str>) -> bool {
    is_blank(current) && !is_blank(requested)
}

fn needs_geocoding(current: &User, requested_zip: Option<&str>) -> bool {
    match requested_zip {
        Some(zip) => current.zipcode.as_deref() != Some(zip) || current.coordinates().is_none(),
        None => current.zipcode.is_some() && current.coordinates().is_none(),
    }
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self { pool })
    }

    pub async fn get(&self, user_id: &str) -> Result<User, ServiceError> {
        self.find(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found."))
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Return the existing user, or create one with the starting token grant.
    /// The flag is true when a new row was inserted.
    pub async fn create_or_get(&self, user_id: &str, new_user: NewUser) -> Result<(User, bool), ServiceError> {
        if let Some(existing) = self.find(user_id).await? {
            return Ok((existing, false));
        }

        if new_user.email.trim().is_empty() {
            return Err(ServiceError::bad_request("Email is required."));
        }

        let grant = config().tokens.initial_grant;
        let mut tx = self.pool.begin().await?;

        let coordinates = match new_user.zipcode.as_deref() {
            Some(zip) => zipcode_service::coordinates(&mut tx, zip).await?,
            None => None,
        };

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, email, first_name, last_name, zipcode, latitude, longitude, tokens)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(new_user.email.trim())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.zipcode)
        .bind(coordinates.map(|(lat, _)| lat))
        .bind(coordinates.map(|(_, lon)| lon))
        .bind(grant)
        .fetch_optional(&mut *tx)
        .await;

        let user = match inserted {
            Ok(Some(user)) => user,
            Ok(None) => {
                // Another request created the same user first
                drop(tx);
                return Ok((self.get(user_id).await?, false));
            }
            Err(e) if is_unique_violation(&e) => return Err(ServiceError::conflict("Email already in use.")),
            Err(e) => return Err(e.into()),
        };

        if grant > 0 {
            transaction_service::record(
                &mut tx,
                user_id,
                &LedgerEntry::new(TransactionType::InitialGrant, grant, "Initial token grant"),
            )
            .await?;
        }

        tx.commit().await?;
        info!(user_id, "user created");
        Ok((user, true))
    }

    pub async fn update(&self, user_id: &str, changes: UserChanges) -> Result<User, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_user(&mut tx, user_id).await?;

        if changes.is_empty() {
            return Ok(current);
        }

        let bonus = earns_referral_bonus(current.referral_source.as_deref(), changes.referral_source.as_deref());
        let geocode = needs_geocoding(&current, changes.zipcode.as_deref());
        let effective_zip = changes.zipcode.clone().or_else(|| current.zipcode.clone());

        let mut builder = UpdateBuilder::new("users", "user_id")?
            .set_opt("first_name", changes.first_name)?
            .set_opt("last_name", changes.last_name)?
            .set_opt("zipcode", changes.zipcode)?
            .set_opt("stickers", changes.stickers.map(Json))?
            .set_opt("enable_notifications", changes.enable_notifications)?
            .set_opt("is_profile_complete", changes.is_profile_complete)?
            .set_opt("video_url", changes.video_url)?
            .set_opt("profile_picture_url", changes.profile_picture_url)?
            .set_opt("referral_source", changes.referral_source)?
            .set_opt("has_seen_calendar_tutorial", changes.has_seen_calendar_tutorial)?;

        if geocode {
            let coordinates = match effective_zip.as_deref() {
                Some(zip) => zipcode_service::coordinates(&mut tx, zip).await?,
                None => None,
            };
            debug!(user_id, ?coordinates, "re-geocoded user");
            builder = builder
                .set("latitude", coordinates.map(|(lat, _)| lat))?
                .set("longitude", coordinates.map(|(_, lon)| lon))?;
        }

        let mut user: User = builder
            .fetch_optional(&mut tx, user_id.to_string())
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found."))?;

        if bonus {
            let amount = config().tokens.referral_bonus;
            if amount > 0 {
                let change = transaction_service::credit(
                    &mut tx,
                    user_id,
                    LedgerEntry::new(TransactionType::Bonus, amount, "Referral source bonus"),
                )
                .await?;
                user.tokens = change.new_token_balance;
                info!(user_id, amount, "referral bonus granted");
            }
        }

        tx.commit().await?;
        Ok(user)
    }

    pub async fn mark_tutorial_seen(&self, user_id: &str) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET has_seen_calendar_tutorial = TRUE, updated_at = NOW() WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or_else(|| ServiceError::not_found("User not found."))
    }

    /// Attach a device token to this user, detaching it from anyone else
    pub async fn set_push_token(&self, user_id: &str, token: &str) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query("UPDATE users SET push_token = NULL WHERE push_token = $1 AND user_id <> $2")
            .bind(token)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if cleared > 0 {
            debug!(user_id, cleared, "push token moved from other users");
        }

        let updated = sqlx::query("UPDATE users SET push_token = $1, updated_at = NOW() WHERE user_id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(ServiceError::not_found("User not found."));
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn block(&self, blocker_id: &str, blocked_id: &str) -> Result<(), ServiceError> {
        if blocker_id == blocked_id {
            return Err(ServiceError::bad_request("You cannot block yourself."));
        }
        if self.find(blocked_id).await?.is_none() {
            return Err(ServiceError::not_found("User to block not found."));
        }

        let inserted = sqlx::query(
            "INSERT INTO user_blocks (blocker_id, blocked_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(ServiceError::conflict("User is already blocked."));
        }
        info!(blocker_id, blocked_id, "user blocked");
        Ok(())
    }

    pub async fn unblock(&self, blocker_id: &str, blocked_id: &str) -> Result<(), ServiceError> {
        let removed = sqlx::query("DELETE FROM user_blocks WHERE blocker_id = $1 AND blocked_id = $2")
            .bind(blocker_id)
            .bind(blocked_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(ServiceError::not_found("Block relationship not found."));
        }
        Ok(())
    }

    pub async fn blocked_users(&self, blocker_id: &str) -> Result<Vec<PublicUser>, ServiceError> {
        let users = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT u.user_id, u.first_name, u.last_name, u.profile_picture_url, u.video_url
            FROM user_blocks b
            JOIN users u ON u.user_id = b.blocked_id
            WHERE b.blocker_id = $1
            ORDER BY u.first_name, u.last_name
            "#,
        )
        .bind(blocker_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Remove the account; dependent rows cascade
    pub async fn delete(&self, user_id: &str) -> Result<(), ServiceError> {
        let removed = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(ServiceError::not_found("User not found."));
        }
        info!(user_id, "user deleted");
        Ok(())
    }
}

async fn lock_user(conn: &mut PgConnection, user_id: &str) -> Result<User, ServiceError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(zipcode: Option<&str>, coordinates: Option<(f64, f64)>) -> User {
        User {
            user_id: "auth0|1".to_string(),
            email: Some("a@example.com".to_string()),
            first_name: None,
            last_name: None,
            profile_picture_url: None,
            video_url: None,
            zipcode: zipcode.map(str::to_string),
            stickers: None,
            tokens: 100,
            enable_notifications: true,
            is_profile_complete: false,
            has_seen_calendar_tutorial: false,
            push_token: None,
            referral_source: None,
            latitude: coordinates.map(|c| c.0),
            longitude: coordinates.map(|c| c.1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn referral_bonus_only_for_first_source() {
        assert!(earns_referral_bonus(None, Some("friend")));
        assert!(earns_referral_bonus(Some("  "), Some("tiktok")));
        assert!(!earns_referral_bonus(Some("friend"), Some("tiktok")));
        assert!(!earns_referral_bonus(None, Some("   ")));
        assert!(!earns_referral_bonus(None, None));
    }

    #[test]
    fn geocodes_on_zip_change_or_missing_coordinates() {
        let located = user(Some("10001"), Some((40.75, -73.99)));
        assert!(!needs_geocoding(&located, None));
        assert!(!needs_geocoding(&located, Some("10001")));
        assert!(needs_geocoding(&located, Some("90210")));

        let unlocated = user(Some("10001"), None);
        assert!(needs_geocoding(&unlocated, None));
        assert!(!needs_geocoding(&user(None, None), None));
    }

    #[test]
    fn empty_changes_detected() {
        assert!(UserChanges::default().is_empty());
        let changes: UserChanges = serde_json::from_value(serde_json::json!({ "firstName": "Ana" })).unwrap();
        assert!(!changes.is_empty());
        // tokens are not client-editable
        let ignored: UserChanges = serde_json::from_value(serde_json::json!({ "tokens": 9999 })).unwrap();
        assert!(ignored.is_empty());
    }
}
