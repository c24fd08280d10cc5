mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn client_token() -> String {
    common::token_for("auth0|validator")
}

#[tokio::test]
async fn malformed_json_is_a_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/attraction"))
        .bearer_auth(client_token())
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn bad_date_id_is_a_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .patch(server.url("/api/dates/not-a-uuid"))
        .bearer_auth(client_token())
        .json(&json!({ "status": "approved" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["message"], "Invalid date id.");
    Ok(())
}

#[tokio::test]
async fn push_token_must_be_a_string() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/users/push-token"))
        .bearer_auth(client_token())
        .json(&json!({ "token": 42 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["token"].is_string());
    Ok(())
}

#[tokio::test]
async fn playable_url_rejects_bad_calendar_id() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .get(server.url("/api/videos/playable-url?calendarId=123"))
        .bearer_auth(client_token())
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["message"], "Invalid calendarId.");
    Ok(())
}

#[tokio::test]
async fn spend_requires_token_amount() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/transactions/spend"))
        .bearer_auth(client_token())
        .json(&json!({ "description": "boost" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
