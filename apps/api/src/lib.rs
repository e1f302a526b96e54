//! Storefront API library
//!
//! This module exposes the core API components for use in integration tests
//! and as a library.

pub mod config;
pub mod error;
pub mod graphql;
pub mod loaders;
pub mod models;
pub mod query;
pub mod routes;
pub mod store;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use loaders::{LoadError, LoaderConfig, Loaders};
pub use routes::api_router;
pub use store::{CatalogStore, MemoryCatalog, PgCatalog, SharedStore};
