mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

const REPLENISH: &str = "/api/system/replenish-tokens";

#[tokio::test]
async fn replenish_requires_cron_secret() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.post(server.url(REPLENISH)).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await?["message"], "Forbidden.");

    let res = client
        .post(server.url(REPLENISH))
        .header("x-cron-secret", "wrong")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(server.url(REPLENISH))
        .json(&json!({ "secret": "also-wrong" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn replenish_accepts_header_or_body_secret() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Past the secret check the unreachable database answers
    let res = client
        .post(server.url(REPLENISH))
        .header("x-cron-secret", common::CRON_SECRET)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = client
        .post(server.url(REPLENISH))
        .json(&json!({ "secret": common::CRON_SECRET }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn replenish_is_not_reachable_with_user_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url(REPLENISH))
        .bearer_auth(common::token_for("auth0|someone"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
