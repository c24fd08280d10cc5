// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT auth) → Elevated (cron secret)
pub mod elevated; // Tier 3: scheduled jobs, shared cron secret (/api/system/*)
pub mod protected; // Tier 2: JWT authentication required (/api/*)
pub mod public; // Tier 1: No authentication required (/, /health)

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a UUID path or query parameter with an API-shaped error
pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {}.", what)))
}
