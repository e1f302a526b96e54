//! GraphQL schema and resolvers for the Storefront
//!
//! This module contains the async-graphql schema including:
//! - Query resolvers for the catalog, customers and carts
//! - Type definitions for all GraphQL objects
//! - The HTTP handler that attaches a fresh loader registry to each request

pub mod handler;
pub mod query;
pub mod schema;
pub mod types;

pub use handler::{graphql_router, GraphQLState};
pub use schema::{build_schema, StorefrontSchema};

use async_graphql::{Context, Result};

use crate::loaders::Loaders;
use crate::store::SharedStore;

/// The loader registry attached to the current request
pub(crate) fn loaders<'a>(ctx: &Context<'a>) -> Result<&'a Loaders> {
    ctx.data::<Loaders>()
}

/// The process-wide catalog store
pub(crate) fn store<'a>(ctx: &Context<'a>) -> Result<&'a SharedStore> {
    ctx.data::<SharedStore>()
}

/// Parse a GraphQL `ID` into a catalog key
pub(crate) fn parse_id(id: &async_graphql::ID) -> Result<i64> {
    id.parse::<i64>().map_err(|_| {
        crate::error::gql_error(crate::error::ApiError::ValidationError(format!(
            "'{}' is not a valid id",
            id.as_str()
        )))
    })
}
