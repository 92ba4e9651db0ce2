mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(format!("{}/", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "MovEat API");
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("success").is_some(), "Response should have 'success' field: {}", body);
    Ok(())
}
