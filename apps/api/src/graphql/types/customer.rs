//! User, address and cart GraphQL types

use async_graphql::{Context, Object, Result, ID};
use chrono::{DateTime, Utc};

use crate::error::gql_error;
use crate::graphql::loaders;
use crate::models::{
    cents_to_decimal, Address as DbAddress, Cart as DbCart, CartItem as DbCartItem, User as DbUser,
};

use super::product::Variant;

/// Storefront customer
pub struct User {
    inner: DbUser,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self { inner: user }
    }
}

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn email(&self) -> &str {
        &self.inner.email
    }

    async fn display_name(&self) -> Option<&str> {
        self.inner.display_name.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Saved addresses, default first
    async fn addresses(&self, ctx: &Context<'_>) -> Result<Vec<Address>> {
        let addresses = loaders(ctx)?
            .addresses_of_user
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(addresses.into_iter().map(Address::from).collect())
    }

    async fn default_address(&self, ctx: &Context<'_>) -> Result<Option<Address>> {
        let addresses = loaders(ctx)?
            .addresses_of_user
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(addresses
            .into_iter()
            .find(|a| a.is_default)
            .map(Address::from))
    }
}

/// Postal address
pub struct Address {
    inner: DbAddress,
}

impl From<DbAddress> for Address {
    fn from(address: DbAddress) -> Self {
        Self { inner: address }
    }
}

#[Object]
impl Address {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn line1(&self) -> &str {
        &self.inner.line1
    }

    async fn line2(&self) -> Option<&str> {
        self.inner.line2.as_deref()
    }

    async fn city(&self) -> &str {
        &self.inner.city
    }

    async fn postal_code(&self) -> &str {
        &self.inner.postal_code
    }

    /// ISO 3166-1 alpha-2 country code
    async fn country(&self) -> &str {
        &self.inner.country
    }

    async fn is_default(&self) -> bool {
        self.inner.is_default
    }
}

/// Shopping cart
pub struct Cart {
    inner: DbCart,
}

impl From<DbCart> for Cart {
    fn from(cart: DbCart) -> Self {
        Self { inner: cart }
    }
}

#[Object]
impl Cart {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }

    /// Owner, absent for guest carts
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(user_id) = self.inner.user_id else {
            return Ok(None);
        };
        let user = loaders(ctx)?
            .user
            .load(user_id)
            .await
            .map_err(gql_error)?;
        Ok(user.map(User::from))
    }

    async fn items(&self, ctx: &Context<'_>) -> Result<Vec<CartItem>> {
        let items = loaders(ctx)?
            .items_of_cart
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(items.into_iter().map(CartItem::from).collect())
    }

    /// Total units across all items
    async fn item_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let items = loaders(ctx)?
            .items_of_cart
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(items.iter().map(|item| i64::from(item.quantity)).sum())
    }

    /// Sum of line totals; items whose variant no longer exists count as zero
    async fn subtotal(&self, ctx: &Context<'_>) -> Result<f64> {
        let loaders = loaders(ctx)?;
        let items = loaders
            .items_of_cart
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        let variants = loaders
            .variant
            .load_many(items.iter().map(|item| item.variant_id))
            .await
            .map_err(gql_error)?;

        let cents: i64 = items
            .iter()
            .zip(variants)
            .filter_map(|(item, variant)| {
                variant.map(|v| v.price_cents * i64::from(item.quantity))
            })
            .sum();
        Ok(cents_to_decimal(cents))
    }
}

/// Line in a cart
pub struct CartItem {
    inner: DbCartItem,
}

impl From<DbCartItem> for CartItem {
    fn from(item: DbCartItem) -> Self {
        Self { inner: item }
    }
}

#[Object]
impl CartItem {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn quantity(&self) -> i32 {
        self.inner.quantity
    }

    async fn variant(&self, ctx: &Context<'_>) -> Result<Option<Variant>> {
        let variant = loaders(ctx)?
            .variant
            .load(self.inner.variant_id)
            .await
            .map_err(gql_error)?;
        Ok(variant.map(Variant::from))
    }

    /// Variant price times quantity, absent when the variant no longer exists
    async fn line_total(&self, ctx: &Context<'_>) -> Result<Option<f64>> {
        let variant = loaders(ctx)?
            .variant
            .load(self.inner.variant_id)
            .await
            .map_err(gql_error)?;
        Ok(variant.map(|v| cents_to_decimal(v.price_cents * i64::from(self.inner.quantity))))
    }
}
