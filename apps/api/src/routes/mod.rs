//! HTTP route handlers for the Storefront API
//!
//! This module contains all REST endpoint handlers including:
//! - Catalog endpoints (products, categories, collections, themes)
//! - Health check and status endpoints
//!
//! [`api_router`] assembles them together with the GraphQL endpoint.

pub mod catalog;
pub mod health;

pub use catalog::{catalog_router, CatalogState};
pub use health::{health_router, HealthState};

use axum::{routing::get, Router};

use crate::graphql::{graphql_router, GraphQLState};
use crate::loaders::LoaderConfig;
use crate::store::SharedStore;

/// Build the full application router around a catalog store
///
/// # Routes
/// - `/api/...` - REST catalog
/// - `/graphql` - GraphQL endpoint (playground on `GET` when enabled)
/// - `/health`, `/health/live`, `/health/ready`
pub fn api_router(store: SharedStore, loader_config: LoaderConfig, playground: bool) -> Router {
    Router::new()
        .route("/", get(root))
        .nest(
            "/api",
            catalog_router(CatalogState::new(store.clone(), loader_config)),
        )
        .nest(
            "/graphql",
            graphql_router(GraphQLState::new(store.clone(), loader_config), playground),
        )
        .nest("/health", health_router(HealthState::new(store)))
}

async fn root() -> &'static str {
    "Storefront API"
}
