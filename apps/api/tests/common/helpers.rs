//! Test helper functions for API integration tests
//!
//! Provides an app wired to an in-memory catalog and request shortcuts.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use storefront_api::loaders::LoaderConfig;
use storefront_api::store::MemoryCatalog;
use storefront_api::api_router;
use tower::ServiceExt;

use super::fixtures::seed_catalog;

/// The full application over a seeded in-memory catalog
pub fn seeded_app() -> (Router, Arc<MemoryCatalog>) {
    let store = Arc::new(MemoryCatalog::new(seed_catalog()));
    (app_with(store.clone()), store)
}

/// The full application over the given store, playground disabled
pub fn app_with(store: Arc<MemoryCatalog>) -> Router {
    api_router(store, LoaderConfig::default(), false)
}

/// Send a GET request and decode the JSON body
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response.into_body()).await)
}

/// Execute a GraphQL query and decode the response document
pub async fn graphql(app: &Router, query: &str) -> Value {
    let payload = serde_json::json!({ "query": query });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response.into_body()).await
}

async fn body_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Assert that a result contains a specific error message substring
#[macro_export]
macro_rules! assert_err_contains {
    ($result:expr, $substr:expr) => {
        match &$result {
            Ok(_) => panic!("Expected error but got Ok"),
            Err(e) => {
                let msg = e.to_string();
                assert!(
                    msg.contains($substr),
                    "Error message '{}' does not contain '{}'",
                    msg,
                    $substr
                );
            }
        }
    };
}
