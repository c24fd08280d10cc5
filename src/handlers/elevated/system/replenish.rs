// handlers/elevated/system/replenish.rs - POST /api/system/replenish-tokens handler

use serde_json::{json, Value};

use crate::config::config;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::transaction_service::TransactionService;

/// Monthly token reset: unused balances expire and every user is topped up
/// to the configured monthly amount.
pub async fn replenish_tokens() -> ApiResult<Value> {
    let summary = TransactionService::new()
        .await?
        .replenish_all(config().tokens.monthly_amount)
        .await?;

    Ok(ApiResponse::success(json!({
        "message": "Monthly token replenishment complete.",
        "successCount": summary.success_count,
        "errorCount": summary.error_count
    })))
}
