// handlers/public/health.rs - GET /health handler

use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;

/// Liveness plus database reachability; 503 when the database is down
pub async fn health() -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unreachable"
                    }
                })),
            )
        }
    }
}
