pub mod attraction_service;
pub mod calendar_day_service;
pub mod date_service;
pub mod notification_service;
pub mod transaction_service;
pub mod user_service;
pub mod zipcode_service;

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::integrations::IntegrationError;

/// Business-rule failures shared by every service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        code: Option<&'static str>,
        details: Option<Value>,
    },

    #[error("Insufficient tokens: balance {balance}, required {required}")]
    InsufficientFunds { balance: i32, required: i32 },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ServiceError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict {
            message: message.into(),
            code: None,
            details: None,
        }
    }

    pub fn scheduling_conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict {
            message: message.into(),
            code: Some("SCHEDULING_CONFLICT"),
            details: None,
        }
    }
}

/// True when `err` is a Postgres unique violation (SQLSTATE 23505)
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::bad_request("Invalid date format. Use YYYY-MM-DD."))
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_time(value: &str) -> Result<NaiveTime, ServiceError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| ServiceError::bad_request("Invalid time format. Use HH:MM."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dates_and_times() {
        assert_eq!(parse_date("2024-02-29").unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("03/01/2024").is_err());
        assert_eq!(parse_time("19:30").unwrap(), NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert_eq!(parse_time("07:05:09").unwrap(), NaiveTime::from_hms_opt(7, 5, 9).unwrap());
        assert!(parse_time("7pm").is_err());
    }
}
