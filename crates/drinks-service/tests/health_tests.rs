//! Health, readiness and metrics endpoint tests.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use drinks_test_utils::TestDrinksServer;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_health_returns_ok() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_health_ignores_database_outage() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;
    server.repository().set_unavailable(true);

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_ready_tracks_database() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<serde_json::Value>().await?,
        json!({"status": "ready", "database": "healthy"})
    );

    server.repository().set_unavailable(true);
    let response = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.json::<serde_json::Value>().await?,
        json!({"status": "not_ready", "database": "unhealthy"})
    );

    server.repository().set_unavailable(false);
    let response = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_metrics_exposes_http_counters() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;

    reqwest::get(format!("{}/drinks", server.url())).await?;
    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(
        body.contains("drinks_http_requests_total"),
        "metrics output missing request counter:\n{body}"
    );
    Ok(())
}

#[tokio::test]
async fn test_metrics_collapse_extension_methods() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;
    let client = reqwest::Client::new();

    for verb in ["BREW", "XYZZY-1", "XYZZY-2"] {
        client
            .request(Method::from_bytes(verb.as_bytes())?, format!("{}/drinks", server.url()))
            .send()
            .await?;
    }
    let body = reqwest::get(format!("{}/metrics", server.url()))
        .await?
        .text()
        .await?;

    assert!(body.contains(r#"method="OTHER""#), "metrics output:\n{body}");
    assert!(!body.contains("BREW"));
    assert!(!body.contains("XYZZY"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> Result<()> {
    let server = TestDrinksServer::spawn().await?;

    let response = reqwest::get(format!("{}/cocktails", server.url())).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
