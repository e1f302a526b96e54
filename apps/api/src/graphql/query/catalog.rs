//! Catalog queries for the Storefront GraphQL API
//!
//! This module provides queries for browsing the catalog:
//! - Products: filtered, sorted pages and lookups by id or slug
//! - Categories and collections: listings and lookups by slug
//! - Themes: the active storefront theme

use async_graphql::{Context, Object, Result, ID};

use crate::error::gql_error;
use crate::graphql::types::{Category, Collection, Product, ProductFilter, ProductPage, Theme};
use crate::graphql::{loaders, parse_id, store};
use crate::models::{
    Category as DbCategory, Collection as DbCollection, Product as DbProduct, Theme as DbTheme,
};
use crate::query::{
    build, Direction, FilterSpec, ListParams, OrderSpec, Pagination, ParentFilter, Predicate,
    SortField,
};
use crate::store::{fetch_many, FromRecord, ListQuery, SharedStore};

/// Catalog-related queries
#[derive(Default)]
pub struct CatalogQuery;

#[Object]
impl CatalogQuery {
    // ==================== Product Queries ====================

    /// Page through published products
    async fn products(
        &self,
        ctx: &Context<'_>,
        filter: Option<ProductFilter>,
        sort_by: Option<String>,
        #[graphql(default = 1)] page: i32,
        #[graphql(default = 20)] limit: i32,
    ) -> Result<ProductPage> {
        let pagination = Pagination::from_ints(page, limit).map_err(gql_error)?;
        let filter = filter.unwrap_or_default();
        let params = ListParams {
            status: filter.status.map(Into::into),
            featured: filter.featured,
            category_slug: filter.category_slug,
            collection_slug: filter.collection_slug,
            search: filter.search,
            sort: sort_by,
            ..ListParams::products()
        };
        params.check_audience().map_err(gql_error)?;
        let (filter, order) = build(&params);
        let query = ListQuery::new(filter, order).paginate(pagination.take(), pagination.skip());

        let store = store(ctx)?;
        let (products, total) = tokio::try_join!(
            fetch_many::<DbProduct>(store.as_ref(), &query),
            store.count(DbProduct::KIND, &query.filter),
        )
        .map_err(gql_error)?;

        // Later `variant.product` lookups hit the cache
        let loaders = loaders(ctx)?;
        for product in &products {
            loaders.product.prime(product.id, Some(product.clone())).await;
        }

        Ok(ProductPage {
            items: products.into_iter().map(Product::from).collect(),
            page: pagination.page,
            limit: pagination.limit,
            total,
        })
    }

    /// Get a published product by ID
    async fn product(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Product>> {
        let id = parse_id(&id)?;
        let product = loaders(ctx)?
            .product
            .load(id)
            .await
            .map_err(gql_error)?;
        Ok(product.filter(DbProduct::is_published).map(Product::from))
    }

    /// Get a published product by slug
    async fn product_by_slug(&self, ctx: &Context<'_>, slug: String) -> Result<Option<Product>> {
        let product = loaders(ctx)?
            .product_by_slug
            .load(slug)
            .await
            .map_err(gql_error)?;
        Ok(product.filter(DbProduct::is_published).map(Product::from))
    }

    // ==================== Taxonomy Queries ====================

    /// List categories
    ///
    /// `parent` is a category id, or `root` for top-level categories.
    async fn categories(
        &self,
        ctx: &Context<'_>,
        visible: Option<bool>,
        parent: Option<String>,
        search: Option<String>,
        sort_by: Option<String>,
        #[graphql(default = 1)] page: i32,
        #[graphql(default = 50)] limit: i32,
    ) -> Result<Vec<Category>> {
        let pagination = Pagination::from_ints(page, limit).map_err(gql_error)?;
        let parent = parent
            .as_deref()
            .map(str::parse::<ParentFilter>)
            .transpose()
            .map_err(|reason| {
                gql_error(crate::error::ApiError::InvalidQueryParam {
                    name: "parent",
                    reason,
                })
            })?;
        let params = ListParams {
            visible,
            parent,
            search,
            sort: sort_by,
            ..ListParams::categories()
        };

        let categories: Vec<DbCategory> = list(store(ctx)?, &params, pagination).await?;
        Ok(categories.into_iter().map(Category::from).collect())
    }

    /// Get a visible category by slug
    async fn category(&self, ctx: &Context<'_>, slug: String) -> Result<Option<Category>> {
        let category: Option<DbCategory> = find_visible_by_slug(store(ctx)?, slug).await?;
        Ok(category.map(Category::from))
    }

    /// List collections
    async fn collections(
        &self,
        ctx: &Context<'_>,
        visible: Option<bool>,
        search: Option<String>,
        sort_by: Option<String>,
        #[graphql(default = 1)] page: i32,
        #[graphql(default = 50)] limit: i32,
    ) -> Result<Vec<Collection>> {
        let pagination = Pagination::from_ints(page, limit).map_err(gql_error)?;
        let params = ListParams {
            visible,
            search,
            sort: sort_by,
            ..ListParams::collections()
        };

        let collections: Vec<DbCollection> = list(store(ctx)?, &params, pagination).await?;
        Ok(collections.into_iter().map(Collection::from).collect())
    }

    /// Get a visible collection by slug
    async fn collection(&self, ctx: &Context<'_>, slug: String) -> Result<Option<Collection>> {
        let collection: Option<DbCollection> = find_visible_by_slug(store(ctx)?, slug).await?;
        Ok(collection.map(Collection::from))
    }

    // ==================== Theme Queries ====================

    /// The theme currently marked active
    async fn active_theme(&self, ctx: &Context<'_>) -> Result<Option<Theme>> {
        let query = ListQuery::new(
            FilterSpec::new().with(Predicate::Active(true)),
            OrderSpec::by(SortField::CreatedAt, Direction::Desc),
        )
        .paginate(1, 0);

        let themes = fetch_many::<DbTheme>(store(ctx)?.as_ref(), &query)
            .await
            .map_err(gql_error)?;
        Ok(themes.into_iter().next().map(Theme::from))
    }
}

async fn list<T: FromRecord>(
    store: &SharedStore,
    params: &ListParams,
    pagination: Pagination,
) -> Result<Vec<T>> {
    let (filter, order) = build(params);
    let query = ListQuery::new(filter, order).paginate(pagination.take(), pagination.skip());
    fetch_many::<T>(store.as_ref(), &query)
        .await
        .map_err(gql_error)
}

async fn find_visible_by_slug<T: FromRecord>(store: &SharedStore, slug: String) -> Result<Option<T>> {
    let query = ListQuery::new(
        FilterSpec::new()
            .with(Predicate::SlugIn(vec![slug]))
            .with(Predicate::Visible(true)),
        OrderSpec::unordered(),
    )
    .paginate(1, 0);

    let rows = fetch_many::<T>(store.as_ref(), &query)
        .await
        .map_err(gql_error)?;
    Ok(rows.into_iter().next())
}
