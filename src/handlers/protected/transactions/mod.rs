// handlers/protected/transactions/mod.rs - Token ledger handlers

use axum::Extension;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::Transaction;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::transaction_service::TransactionService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub token_amount: Option<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount_usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendRequest {
    pub token_amount: Option<i32>,
    #[serde(default)]
    pub description: String,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}

fn required_amount(amount: Option<i32>) -> Result<i32, ApiError> {
    amount.ok_or_else(|| ApiError::field_error("tokenAmount", "tokenAmount must be a positive integer."))
}

/// GET /api/transactions/me - ledger, newest first
pub async fn transactions_list(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<Transaction>> {
    let history = TransactionService::new().await?.history(&auth.user_id).await?;
    Ok(ApiResponse::success(history))
}

/// POST /api/transactions/purchase
pub async fn transactions_purchase(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<PurchaseRequest>,
) -> ApiResult<Value> {
    let amount = required_amount(request.token_amount)?;
    let change = TransactionService::new()
        .await?
        .purchase(&auth.user_id, amount, &request.description, request.amount_usd)
        .await?;

    Ok(ApiResponse::created(json!({
        "message": "Tokens purchased successfully.",
        "transaction": change.transaction,
        "newTokenBalance": change.new_token_balance
    })))
}

/// POST /api/transactions/spend
pub async fn transactions_spend(
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<SpendRequest>,
) -> ApiResult<Value> {
    let amount = required_amount(request.token_amount)?;
    let description = match request.description.trim() {
        "" => "Token spend",
        d => d,
    };
    let related = request
        .related_entity_type
        .zip(request.related_entity_id);

    let change = TransactionService::new()
        .await?
        .spend(&auth.user_id, amount, description, related)
        .await?;

    Ok(ApiResponse::success(json!({
        "message": "Tokens spent successfully.",
        "transaction": change.transaction,
        "newTokenBalance": change.new_token_balance
    })))
}
