mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let server = common::ensure_server().await?;

    for path in ["/health", "/api/health"] {
        let res = reqwest::get(server.url(path)).await?;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", path);

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["status"], "degraded");
        assert!(body["data"]["timestamp"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "datecal-api");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_return_json_404() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new().delete(server.url("/api/unknown/thing")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Route not found: DELETE /api/unknown/thing");
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
