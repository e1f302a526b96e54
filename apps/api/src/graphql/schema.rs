//! GraphQL schema builder for the Storefront
//!
//! The schema only carries process-wide data (the catalog store). Loaders are
//! request data, attached by [`graphql_handler`](super::handler::graphql_handler).

use async_graphql::{EmptyMutation, EmptySubscription, Schema};

use crate::store::SharedStore;

use super::query::Query;

/// The Storefront GraphQL schema type
pub type StorefrontSchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Build the schema around a catalog store
pub fn build_schema(store: SharedStore) -> StorefrontSchema {
    Schema::build(Query::default(), EmptyMutation, EmptySubscription)
        .data(store)
        .finish()
}
