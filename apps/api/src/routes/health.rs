//! Health check HTTP route handlers
//!
//! Provides endpoints for checking the health of the API and its store:
//! - `GET /health` - Simple liveness check (returns 200 OK)
//! - `GET /health/ready` - Readiness check (pings the catalog store)
//! - `GET /health/live` - Kubernetes-style liveness probe

use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::store::SharedStore;

/// Upper bound on a readiness ping
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state for health check handlers
#[derive(Clone)]
pub struct HealthState {
    pub store: SharedStore,
}

impl HealthState {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

/// Result of checking one dependency
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub name: &'static str,
    pub status: ServiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated readiness response
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResponse {
    pub status: ServiceStatus,
    pub services: Vec<ServiceHealth>,
    pub version: &'static str,
}

impl HealthCheckResponse {
    fn new(services: Vec<ServiceHealth>) -> Self {
        let status = if services.iter().all(|s| s.status == ServiceStatus::Healthy) {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        };
        Self {
            status,
            services,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness_probe))
        .route("/ready", get(readiness_probe))
        .with_state(state)
}

/// Simple health check - always returns OK if the server is running
async fn simple_health() -> &'static str {
    "OK"
}

/// Liveness probe for Kubernetes
///
/// Does not touch the store; that's what readiness is for.
async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe - verifies the catalog store answers
///
/// # Response
/// - 200 OK if the store is reachable
/// - 503 Service Unavailable otherwise
async fn readiness_probe(State(state): State<HealthState>) -> impl IntoResponse {
    let database = check_store(&state.store).await;
    let response = HealthCheckResponse::new(vec![database]);

    let status_code = if response.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

async fn check_store(store: &SharedStore) -> ServiceHealth {
    let start = Instant::now();
    let outcome = tokio::time::timeout(PING_TIMEOUT, store.ping()).await;
    let elapsed = start.elapsed().as_millis() as u64;

    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(_) => Some(format!("ping timed out after {}s", PING_TIMEOUT.as_secs())),
    };
    if let Some(error) = &error {
        tracing::warn!(error = %error, "catalog store readiness check failed");
    }

    ServiceHealth {
        name: "database",
        status: if error.is_none() {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        },
        response_time_ms: Some(elapsed),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCatalog;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_simple_health() {
        let response = simple_health().await;
        assert_eq!(response, "OK");
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let response = liveness_probe().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_store_check_reports_failure() {
        let memory = Arc::new(MemoryCatalog::default());
        let store: SharedStore = memory.clone();

        assert_eq!(check_store(&store).await.status, ServiceStatus::Healthy);

        memory.fail_with("connection refused");
        let health = check_store(&store).await;
        assert_eq!(health.status, ServiceStatus::Unhealthy);
        assert!(health.error.unwrap().contains("connection refused"));
    }
}
