//! Integration tests for health check endpoints
//!
//! Tests the health check API routes to ensure proper responses
//! for liveness and readiness probes.

mod common;

use axum::http::StatusCode;

use common::{get_json, seeded_app};

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Storefront API");
}

#[tokio::test]
async fn test_simple_health_check() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_liveness_probe() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/health/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_readiness_probe_healthy() {
    let (app, _) = seeded_app();

    let (status, body) = get_json(&app, "/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"][0]["name"], "database");
    assert_eq!(body["services"][0]["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_probe_reports_unreachable_store() {
    let (app, store) = seeded_app();
    store.fail_with("connection refused");

    let (status, body) = get_json(&app, "/health/ready").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["services"][0]["status"], "unhealthy");
}

#[tokio::test]
async fn test_liveness_ignores_store_failure() {
    let (app, store) = seeded_app();
    store.fail_with("connection refused");

    let (status, _) = get_json(&app, "/health/live").await;

    assert_eq!(status, StatusCode::OK);
}
