use axum::{
    body::{to_bytes, Body},
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config;
use crate::error::ApiError;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Largest body we will buffer while looking for a `secret` field
const MAX_CRON_BODY_BYTES: usize = 64 * 1024;

/// Guards scheduled-job endpoints. The shared secret may arrive in the
/// `x-cron-secret` header or as `{"secret": "..."}` in a JSON body.
pub async fn cron_secret_middleware(request: Request, next: Next) -> Response {
    let Some(expected) = config::config().security.cron_secret.as_deref() else {
        tracing::error!("CRON_JOB_SECRET is not configured; rejecting scheduled job call");
        return ApiError::forbidden("Forbidden.").into_response();
    };

    let header_secret = request
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_CRON_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::bad_request("Request body too large").into_response(),
    };
    let body_secret = serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|v| v.get("secret").and_then(|s| s.as_str()).map(str::to_string));

    if !secret_matches(expected, header_secret.as_deref(), body_secret.as_deref()) {
        tracing::warn!("Scheduled job call with missing or wrong secret");
        return ApiError::forbidden("Forbidden.").into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn secret_matches(expected: &str, header: Option<&str>, body: Option<&str>) -> bool {
    [header, body].into_iter().flatten().any(|candidate| candidate == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_header_or_body_secret() {
        assert!(secret_matches("s3cret", Some("s3cret"), None));
        assert!(secret_matches("s3cret", None, Some("s3cret")));
        assert!(secret_matches("s3cret", Some("wrong"), Some("s3cret")));
    }

    #[test]
    fn rejects_missing_or_wrong_secret() {
        assert!(!secret_matches("s3cret", None, None));
        assert!(!secret_matches("s3cret", Some("nope"), Some("")));
    }
}
