mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

async fn get_with_auth(path: &str, authorization: Option<&str>) -> Result<(StatusCode, Value)> {
    let server = common::ensure_server().await?;
    let mut request = reqwest::Client::new().get(server.url(path));
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    let res = request.send().await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

#[tokio::test]
async fn missing_or_malformed_credentials_are_rejected() -> Result<()> {
    for auth in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer ")] {
        let (status, body) = get_with_auth("/api/users/tokens", auth).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{:?}", auth);
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn forged_token_is_rejected() -> Result<()> {
    let (status, body) = get_with_auth("/api/notifications", Some("Bearer not.a.jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token.");
    Ok(())
}

#[tokio::test]
async fn token_without_subject_is_rejected() -> Result<()> {
    let token = common::token_for("");
    let (status, body) = get_with_auth("/api/dates/me/upcoming", Some(&format!("Bearer {}", token))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token: User identifier missing.");
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_handler() -> Result<()> {
    // Authenticated, so the failure comes from the unreachable database
    let token = common::token_for("auth0|integration");
    let (status, body) = get_with_auth("/api/users/tokens", Some(&format!("Bearer {}", token))).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}
