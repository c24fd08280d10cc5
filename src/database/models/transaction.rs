use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::TransactionType;

/// Token ledger row; `token_amount` is signed (negative for spends and expiries)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub transaction_type: TransactionType,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount_usd: Option<Decimal>,
    pub token_amount: i32,
    pub description: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}
