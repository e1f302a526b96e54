//! Product, variant and review GraphQL types

use async_graphql::{Context, Enum, InputObject, Object, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};

use crate::error::gql_error;
use crate::graphql::loaders;
use crate::models::{
    cents_to_decimal, selection_value, Product as DbProduct, Review as DbReview,
    Variant as DbVariant,
};
use crate::query::{clamp_limit, clamp_offset, MAX_NESTED_LIMIT};

use super::customer::User;
use super::taxonomy::{Category, Collection};

/// Publication state of a product
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
#[graphql(remote = "crate::models::ProductStatus")]
pub enum ProductStatus {
    Draft,
    Published,
    Archived,
}

/// Filters accepted by the `products` query
#[derive(InputObject, Debug, Default)]
pub struct ProductFilter {
    /// Only `PUBLISHED` is accepted
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
    pub category_slug: Option<String>,
    pub collection_slug: Option<String>,
    /// Case-insensitive substring of the product name
    pub search: Option<String>,
}

/// One page of products
#[derive(SimpleObject)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// Product exposed via GraphQL
pub struct Product {
    inner: DbProduct,
}

impl From<DbProduct> for Product {
    fn from(product: DbProduct) -> Self {
        Self { inner: product }
    }
}

#[Object]
impl Product {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn slug(&self) -> &str {
        &self.inner.slug
    }

    async fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    async fn status(&self) -> ProductStatus {
        self.inner.status.into()
    }

    async fn featured(&self) -> bool {
        self.inner.featured
    }

    /// Price as a decimal amount
    async fn price(&self) -> f64 {
        cents_to_decimal(self.inner.price_cents)
    }

    /// Original price when the product is discounted
    async fn compare_at_price(&self) -> Option<f64> {
        self.inner.compare_at_cents.map(cents_to_decimal)
    }

    async fn on_sale(&self) -> bool {
        self.inner.on_sale()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }

    // Relationship resolvers

    /// Variants in display order
    async fn variants(&self, ctx: &Context<'_>) -> Result<Vec<Variant>> {
        let variants = loaders(ctx)?
            .variants_of_product
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(variants.into_iter().map(Variant::from).collect())
    }

    /// Published reviews, newest first
    async fn reviews(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 20)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Review>> {
        let reviews = loaders(ctx)?
            .reviews_of_product
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(reviews
            .into_iter()
            .skip(clamp_offset(offset))
            .take(clamp_limit(limit, MAX_NESTED_LIMIT))
            .map(Review::from)
            .collect())
    }

    async fn review_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let reviews = loaders(ctx)?
            .reviews_of_product
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(reviews.len() as i64)
    }

    /// Mean rating of published reviews
    async fn average_rating(&self, ctx: &Context<'_>) -> Result<Option<f64>> {
        let reviews = loaders(ctx)?
            .reviews_of_product
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        if reviews.is_empty() {
            return Ok(None);
        }
        let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
        Ok(Some(total as f64 / reviews.len() as f64))
    }

    async fn categories(&self, ctx: &Context<'_>) -> Result<Vec<Category>> {
        let categories = loaders(ctx)?
            .categories_of_product
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(categories.into_iter().map(Category::from).collect())
    }

    async fn collections(&self, ctx: &Context<'_>) -> Result<Vec<Collection>> {
        let collections = loaders(ctx)?
            .collections_of_product
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(collections.into_iter().map(Collection::from).collect())
    }
}

/// One option selected for a variant
#[derive(SimpleObject, Debug, Clone)]
pub struct VariantOption {
    pub name: String,
    pub value: String,
}

/// Purchasable variant of a product
pub struct Variant {
    inner: DbVariant,
}

impl From<DbVariant> for Variant {
    fn from(variant: DbVariant) -> Self {
        Self { inner: variant }
    }
}

impl Variant {
    async fn selection(&self, ctx: &Context<'_>, option_name: &str) -> Result<Option<String>> {
        let selections = loaders(ctx)?
            .selections_of_variant
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(selection_value(&selections, option_name).map(str::to_string))
    }
}

#[Object]
impl Variant {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn sku(&self) -> &str {
        &self.inner.sku
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn price(&self) -> f64 {
        cents_to_decimal(self.inner.price_cents)
    }

    async fn stock(&self) -> i32 {
        self.inner.stock
    }

    async fn in_stock(&self) -> bool {
        self.inner.in_stock()
    }

    async fn position(&self) -> i32 {
        self.inner.position
    }

    /// Selected size, if the variant has one
    async fn size(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        self.selection(ctx, "size").await
    }

    /// Selected color, if the variant has one
    async fn color(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        self.selection(ctx, "color").await
    }

    /// Every option selected for this variant
    async fn options(&self, ctx: &Context<'_>) -> Result<Vec<VariantOption>> {
        let selections = loaders(ctx)?
            .selections_of_variant
            .load(self.inner.id)
            .await
            .map_err(gql_error)?;
        Ok(selections
            .into_iter()
            .map(|s| VariantOption {
                name: s.option_name,
                value: s.value,
            })
            .collect())
    }

    async fn product(&self, ctx: &Context<'_>) -> Result<Option<Product>> {
        let product = loaders(ctx)?
            .product
            .load(self.inner.product_id)
            .await
            .map_err(gql_error)?;
        Ok(product.map(Product::from))
    }
}

/// Customer review of a product
pub struct Review {
    inner: DbReview,
}

impl From<DbReview> for Review {
    fn from(review: DbReview) -> Self {
        Self { inner: review }
    }
}

#[Object]
impl Review {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    /// 1 to 5
    async fn rating(&self) -> i32 {
        i32::from(self.inner.rating)
    }

    async fn title(&self) -> Option<&str> {
        self.inner.title.as_deref()
    }

    async fn body(&self) -> Option<&str> {
        self.inner.body.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Reviewer, absent for anonymous reviews
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
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
}
