mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let server = common::ensure_server().await?;

    let body: serde_json::Value = reqwest::get(server.url("/")).await?.json().await?;
    assert_eq!(body["name"], "Taskboard API");
    assert!(body["endpoints"]["tasks"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_json_404() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api/nothing-here")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn binary_serves_until_dropped() -> Result<()> {
    let process = common::ServerProcess::spawn()?;
    process.wait_ready(Duration::from_secs(10)).await?;

    let health = process.url("/health");
    assert_eq!(reqwest::get(&health).await?.status(), StatusCode::OK);

    // Dropping the handle kills the child and frees its port
    drop(process);
    assert!(reqwest::get(&health).await.is_err());
    Ok(())
}
