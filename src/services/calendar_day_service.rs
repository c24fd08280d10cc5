use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{is_unique_violation, parse_date, ServiceError};
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{CalendarDay, Story};
use crate::integrations::vimeo::{normalize_video_uri, VimeoClient};

const METERS_PER_MILE: f64 = 1609.34;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDate {
    pub date: NaiveDate,
    pub has_my_video: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedVideo {
    pub calendar_day: CalendarDay,
    pub has_nearby_stories: bool,
}

pub struct CalendarDayService {
    pool: PgPool,
    vimeo: &'static VimeoClient,
}

impl CalendarDayService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self {
            pool,
            vimeo: VimeoClient::shared(),
        })
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<CalendarDay>, ServiceError> {
        let days = sqlx::query_as::<_, CalendarDay>(
            "SELECT * FROM calendar_day WHERE user_id = $1 ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(days)
    }

    /// Days on which the user has recorded a video
    pub async fn active_dates(&self, user_id: &str) -> Result<Vec<ActiveDate>, ServiceError> {
        let rows: Vec<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT date FROM calendar_day
            WHERE user_id = $1 AND (vimeo_uri IS NOT NULL OR user_video_url IS NOT NULL)
            ORDER BY date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date,)| ActiveDate { date, has_my_video: true })
            .collect())
    }

    pub async fn get(&self, user_id: &str, date: &str) -> Result<CalendarDay, ServiceError> {
        let date = parse_date(date)?;
        self.find(user_id, date)
            .await?
            .ok_or_else(|| ServiceError::not_found("Calendar day not found."))
    }

    async fn find(&self, user_id: &str, date: NaiveDate) -> Result<Option<CalendarDay>, ServiceError> {
        let day = sqlx::query_as::<_, CalendarDay>("SELECT * FROM calendar_day WHERE user_id = $1 AND date = $2")
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(day)
    }

    pub async fn create(&self, user_id: &str, date: &str) -> Result<CalendarDay, ServiceError> {
        let date = parse_date(date)?;
        let inserted = sqlx::query_as::<_, CalendarDay>(
            "INSERT INTO calendar_day (user_id, date) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(day) => Ok(day),
            Err(e) if is_unique_violation(&e) => {
                Err(ServiceError::conflict("A calendar entry already exists for this date."))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record a video the client uploaded to Vimeo, replacing any previous one
    pub async fn attach_video(&self, user_id: &str, date: &str, vimeo_uri: &str) -> Result<AttachedVideo, ServiceError> {
        let date = parse_date(date)?;
        let vimeo_uri = normalize_video_uri(vimeo_uri)
            .ok_or_else(|| ServiceError::bad_request("vimeoUri must look like /videos/<id>."))?;

        let previous = self.find(user_id, date).await?.and_then(|day| day.vimeo_uri);

        let calendar_day = sqlx::query_as::<_, CalendarDay>(
            r#"
            INSERT INTO calendar_day (user_id, date, vimeo_uri, processing_status)
            VALUES ($1, $2, $3, 'pending')
            ON CONFLICT (user_id, date)
            DO UPDATE SET vimeo_uri = EXCLUDED.vimeo_uri, processing_status = 'pending', updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(&vimeo_uri)
        .fetch_one(&self.pool)
        .await?;

        if let Some(old) = previous.filter(|old| *old != vimeo_uri) {
            self.delete_from_vimeo(&old).await;
        }

        let has_nearby_stories = !self.nearby_stories(user_id, date).await?.is_empty();
        info!(user_id, %date, video = %vimeo_uri, "video attached");

        Ok(AttachedVideo {
            calendar_day,
            has_nearby_stories,
        })
    }

    /// Ask Vimeo how far processing has got and store the answer
    pub async fn refresh_status(&self, user_id: &str, date: &str) -> Result<CalendarDay, ServiceError> {
        let day = self.get(user_id, date).await?;
        let vimeo_uri = day
            .vimeo_uri
            .as_deref()
            .ok_or_else(|| ServiceError::bad_request("No video is attached to this day."))?;

        let status = self.vimeo.processing_status(vimeo_uri).await?;

        let updated = sqlx::query_as::<_, CalendarDay>(
            "UPDATE calendar_day SET processing_status = $2, updated_at = NOW() WHERE calendar_id = $1 RETURNING *",
        )
        .bind(day.calendar_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    /// Remove the day's video from Vimeo and drop the calendar entry
    pub async fn delete_video(&self, user_id: &str, date: &str) -> Result<(), ServiceError> {
        let day = self.get(user_id, date).await?;
        if let Some(uri) = day.vimeo_uri.as_deref() {
            self.delete_from_vimeo(uri).await;
        }

        sqlx::query("DELETE FROM calendar_day WHERE calendar_id = $1")
            .bind(day.calendar_id)
            .execute(&self.pool)
            .await?;
        info!(user_id, date = %day.date, "calendar day deleted");
        Ok(())
    }

    async fn delete_from_vimeo(&self, uri: &str) {
        if let Err(e) = self.vimeo.delete_video(uri).await {
            warn!("Could not delete Vimeo video {}: {}", uri, e);
        }
    }

    /// Finished stories near the caller, each with a fresh playable link
    pub async fn stories(&self, user_id: &str, date: &str) -> Result<Vec<Story>, ServiceError> {
        let date = parse_date(date)?;
        let mut stories = self.nearby_stories(user_id, date).await?;

        let links = join_all(stories.iter().map(|story| self.vimeo.playable_url(&story.vimeo_uri))).await;
        for (story, link) in stories.iter_mut().zip(links) {
            match link {
                Ok(url) => story.playable_url = url,
                Err(e) => warn!("No playable link for {}: {}", story.vimeo_uri, e),
            }
        }
        Ok(stories)
    }

    async fn nearby_stories(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Story>, ServiceError> {
        let origin: Option<(Option<f64>, Option<f64>)> =
            sqlx::query_as("SELECT latitude, longitude FROM users WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((latitude, longitude)) = origin.and_then(|(lat, lon)| lat.zip(lon)) else {
            return Ok(Vec::new());
        };

        let radius_meters = config().stories.max_distance_miles * METERS_PER_MILE;

        let stories = sqlx::query_as::<_, Story>(
            r#"
            SELECT c.calendar_id, c.user_id, c.date, c.vimeo_uri, c.processing_status,
                   COALESCE(NULLIF(TRIM(CONCAT_WS(' ', u.first_name, u.last_name)), ''), 'User') AS user_name,
                   u.profile_picture_url, u.zipcode,
                   earth_distance(ll_to_earth(u.latitude, u.longitude), ll_to_earth($2, $3)) / $6 AS distance
            FROM calendar_day c
            JOIN users u ON u.user_id = c.user_id
            WHERE c.date = $1
              AND c.processing_status = 'complete'
              AND c.vimeo_uri IS NOT NULL
              AND c.user_id <> $4
              AND u.latitude IS NOT NULL AND u.longitude IS NOT NULL
              AND earth_box(ll_to_earth($2, $3), $5) @> ll_to_earth(u.latitude, u.longitude)
              AND earth_distance(ll_to_earth(u.latitude, u.longitude), ll_to_earth($2, $3)) <= $5
              AND NOT EXISTS (
                  SELECT 1 FROM user_blocks b
                  WHERE (b.blocker_id = $4 AND b.blocked_id = c.user_id)
                     OR (b.blocker_id = c.user_id AND b.blocked_id = $4)
              )
            ORDER BY distance
            "#,
        )
        .bind(date)
        .bind(latitude)
        .bind(longitude)
        .bind(user_id)
        .bind(radius_meters)
        .bind(METERS_PER_MILE)
        .fetch_all(&self.pool)
        .await?;
        Ok(stories)
    }

    /// Playable link for a raw Vimeo identifier, or for the video stored on a calendar day
    pub async fn playable_url(&self, uri: Option<&str>, calendar_id: Option<Uuid>) -> Result<String, ServiceError> {
        let video_uri = match (uri.and_then(normalize_video_uri), calendar_id) {
            (Some(uri), _) => uri,
            (None, Some(calendar_id)) => {
                let stored: Option<(Option<String>,)> =
                    sqlx::query_as("SELECT vimeo_uri FROM calendar_day WHERE calendar_id = $1")
                        .bind(calendar_id)
                        .fetch_optional(&self.pool)
                        .await?;
                stored
                    .and_then(|(uri,)| uri)
                    .ok_or_else(|| ServiceError::not_found("No video found for this calendar day."))?
            }
            (None, None) => return Err(ServiceError::bad_request("A valid video uri or calendarId is required.")),
        };

        self.vimeo
            .playable_url(&video_uri)
            .await?
            .ok_or_else(|| ServiceError::not_found("Video is not playable yet."))
    }
}
