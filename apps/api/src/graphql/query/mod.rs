//! GraphQL queries for the Storefront
//!
//! This module contains all query resolvers, organized by domain.

mod catalog;
mod customer;

pub use catalog::CatalogQuery;
pub use customer::CustomerQuery;

use async_graphql::MergedObject;

/// Root query type combining all query domains
#[derive(MergedObject, Default)]
pub struct Query(CatalogQuery, CustomerQuery);
