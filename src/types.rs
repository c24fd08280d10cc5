// Shared domain enums mapped onto the Postgres enum types in migrations/
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a proposed date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "date_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DateStatus {
    Pending,
    Approved,
    Declined,
    Cancelled,
    Completed,
    PendingConflict,
    NeedsRescheduling,
}

impl DateStatus {
    /// Statuses from which a date can still be rescheduled
    pub fn is_reschedulable(self) -> bool {
        matches!(self, DateStatus::Approved | DateStatus::Pending | DateStatus::NeedsRescheduling)
    }

    pub fn is_closed(self) -> bool {
        matches!(self, DateStatus::Cancelled | DateStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "date_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DateOutcome {
    Amazing,
    NoShowCancelled,
    Other,
}

impl FromStr for DateOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amazing" => Ok(DateOutcome::Amazing),
            "no_show_cancelled" => Ok(DateOutcome::NoShowCancelled),
            "other" => Ok(DateOutcome::Other),
            _ => Err(format!("Invalid outcome: {}", s)),
        }
    }
}

/// Vimeo processing state of a calendar-day video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "processing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Unread,
    Read,
}

/// Token ledger entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    InitialGrant,
    MonthlyExpiry,
    Purchase,
    Replenishment,
    Admin,
    Deduction,
    Bonus,
}

/// Kinds of user-facing notifications; stored as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    AttractionProposal,
    MatchProposal,
    DateProposal,
    DateApproved,
    DateDeclined,
    DateRescheduled,
    DateCancelled,
    DateConflict,
    DateNeedsRescheduling,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::AttractionProposal => "ATTRACTION_PROPOSAL",
            NotificationType::MatchProposal => "MATCH_PROPOSAL",
            NotificationType::DateProposal => "DATE_PROPOSAL",
            NotificationType::DateApproved => "DATE_APPROVED",
            NotificationType::DateDeclined => "DATE_DECLINED",
            NotificationType::DateRescheduled => "DATE_RESCHEDULED",
            NotificationType::DateCancelled => "DATE_CANCELLED",
            NotificationType::DateConflict => "DATE_CONFLICT",
            NotificationType::DateNeedsRescheduling => "DATE_NEEDS_RESCHEDULING",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(DateStatus::NeedsRescheduling).unwrap(), "needs_rescheduling");
        assert_eq!(serde_json::to_value(DateStatus::PendingConflict).unwrap(), "pending_conflict");
    }

    #[test]
    fn notification_type_matches_wire_name() {
        let wire = serde_json::to_value(NotificationType::DateNeedsRescheduling).unwrap();
        assert_eq!(wire, NotificationType::DateNeedsRescheduling.as_str());
    }

    #[test]
    fn outcome_parses_known_values_only() {
        assert_eq!("no_show_cancelled".parse::<DateOutcome>(), Ok(DateOutcome::NoShowCancelled));
        assert!("great".parse::<DateOutcome>().is_err());
    }
}
