//! Customer queries for the Storefront GraphQL API

use async_graphql::{Context, Object, Result, ID};

use crate::error::gql_error;
use crate::graphql::types::{Cart, User};
use crate::graphql::{loaders, parse_id};

/// Customer and cart lookups
#[derive(Default)]
pub struct CustomerQuery;

#[Object]
impl CustomerQuery {
    /// Get a user by ID
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<Option<User>> {
        let id = parse_id(&id)?;
        let user = loaders(ctx)?.user.load(id).await.map_err(gql_error)?;
        Ok(user.map(User::from))
    }

    /// Get a cart by ID
    async fn cart(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Cart>> {
        let id = parse_id(&id)?;
        let cart = loaders(ctx)?.cart.load(id).await.map_err(gql_error)?;
        Ok(cart.map(Cart::from))
    }
}
