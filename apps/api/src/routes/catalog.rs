//! Catalog HTTP route handlers
//!
//! Read-only storefront endpoints:
//! - `GET /products` - Paginated, filtered product listing
//! - `GET /products/:slug` - Product with variants, categories, collections, reviews
//! - `GET /categories` - Paginated category listing
//! - `GET /categories/:slug` - Category with its children and products
//! - `GET /collections` - Paginated collection listing
//! - `GET /collections/:slug` - Collection with its products
//! - `GET /themes/active` - The active storefront theme
//!
//! List endpoints share the query builder with the GraphQL list fields.
//! Detail endpoints resolve their relations through a per-request
//! [`Loaders`] registry.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::loaders::{LoaderConfig, Loaders};
use crate::models::{selection_value, Category, Collection, Product, Review, Theme, Variant};
use crate::query::{
    build, Direction, FilterSpec, ListParams, OrderSpec, Pagination, ParentFilter, Predicate,
    SortField, DEFAULT_LIMIT,
};
use crate::store::{fetch_many, FromRecord, ListQuery, SharedStore};

/// Shared state for catalog handlers
#[derive(Clone)]
pub struct CatalogState {
    pub store: SharedStore,
    pub loader_config: LoaderConfig,
}

impl CatalogState {
    pub fn new(store: SharedStore, loader_config: LoaderConfig) -> Self {
        Self {
            store,
            loader_config,
        }
    }

    fn loaders(&self) -> Loaders {
        Loaders::with_config(self.store.clone(), self.loader_config)
    }
}

/// Create the catalog router
pub fn catalog_router(state: CatalogState) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:slug", get(product_detail))
        .route("/categories", get(list_categories))
        .route("/categories/:slug", get(category_detail))
        .route("/collections", get(list_collections))
        .route("/collections/:slug", get(collection_detail))
        .route("/themes/active", get(active_theme))
        .with_state(state)
}

/// Page of results with pagination metadata
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// Query parameters for `GET /products`
///
/// Values are taken as raw strings and validated by the handler so a bad
/// value produces a descriptive 400 instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub featured: Option<String>,
    pub category: Option<String>,
    pub collection: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Query parameters for `GET /categories` and `GET /collections`
#[derive(Debug, Default, Deserialize)]
pub struct TaxonomyListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub visible: Option<String>,
    pub parent: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VariantView {
    #[serde(flatten)]
    pub variant: Variant,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<VariantView>,
    pub categories: Vec<Category>,
    pub collections: Vec<Collection>,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct CollectionDetail {
    #[serde(flatten)]
    pub collection: Collection,
    pub products: Vec<Product>,
}

/// List products
///
/// # Query Parameters
/// - page, limit: positive integers (limit capped at 100)
/// - status: published (other statuses are not listed publicly)
/// - featured: true | false
/// - category, collection: slug of a linked category/collection
/// - search: case-insensitive substring of the name
/// - sort: newest | oldest | price-asc | price-desc | name-asc | name-desc
async fn list_products(
    State(state): State<CatalogState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Json<ListResponse<Product>>> {
    let pagination = pagination(&query.page, &query.limit)?;
    let params = ListParams {
        status: parse_param("status", &query.status)?,
        featured: parse_bool("featured", &query.featured)?,
        category_slug: query.category,
        collection_slug: query.collection,
        search: query.search,
        sort: query.sort,
        ..ListParams::products()
    };
    params.check_audience()?;

    list_page(&state.store, &params, pagination).await.map(Json)
}

/// Product detail by slug; drafts and archived products are not found
async fn product_detail(
    State(state): State<CatalogState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    let loaders = state.loaders();

    let product = loaders
        .product_by_slug
        .load(slug.clone())
        .await?
        .filter(Product::is_published)
        .ok_or_else(|| ApiError::not_found("product", slug))?;

    let (variants, categories, collections, reviews) = tokio::try_join!(
        loaders.variants_of_product.load(product.id),
        loaders.categories_of_product.load(product.id),
        loaders.collections_of_product.load(product.id),
        loaders.reviews_of_product.load(product.id),
    )?;

    let selections = loaders
        .selections_of_variant
        .load_many(variants.iter().map(|v| v.id))
        .await?;
    let variants = variants
        .into_iter()
        .zip(selections)
        .map(|(variant, selections)| VariantView {
            size: selection_value(&selections, "size").map(str::to_string),
            color: selection_value(&selections, "color").map(str::to_string),
            variant,
        })
        .collect();

    tracing::debug!(
        slug = %product.slug,
        fetches = loaders.total_fetches(),
        "resolved product detail"
    );

    Ok(Json(ProductDetail {
        product,
        variants,
        categories,
        collections,
        reviews,
    }))
}

/// List categories
///
/// # Query Parameters
/// - page, limit, search, sort: as for products
/// - visible: true | false
/// - parent: `root` for top-level categories, or a parent category id
async fn list_categories(
    State(state): State<CatalogState>,
    Query(query): Query<TaxonomyListQuery>,
) -> ApiResult<Json<ListResponse<Category>>> {
    let pagination = pagination(&query.page, &query.limit)?;
    let params = ListParams {
        visible: parse_bool("visible", &query.visible)?,
        parent: parse_param::<ParentFilter>("parent", &query.parent)?,
        search: query.search,
        sort: query.sort,
        ..ListParams::categories()
    };

    list_page(&state.store, &params, pagination).await.map(Json)
}

/// Category detail by slug with its direct children and newest products
async fn category_detail(
    State(state): State<CatalogState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<CategoryDetail>> {
    let category: Category = find_by_slug(&state.store, &slug)
        .await?
        .filter(|c: &Category| c.is_visible)
        .ok_or_else(|| ApiError::not_found("category", slug.as_str()))?;

    let children_query = ListQuery::new(
        FilterSpec::new()
            .with(Predicate::Parent(ParentFilter::Id(category.id)))
            .with(Predicate::Visible(true)),
        OrderSpec::by(SortField::Position, Direction::Asc),
    );
    let (products_filter, products_order) = build(&ListParams {
        category_slug: Some(slug),
        ..ListParams::products()
    });
    let products_query =
        ListQuery::new(products_filter, products_order).paginate(i64::from(DEFAULT_LIMIT), 0);

    let (children, products) = tokio::try_join!(
        fetch_many::<Category>(state.store.as_ref(), &children_query),
        fetch_many::<Product>(state.store.as_ref(), &products_query),
    )?;

    Ok(Json(CategoryDetail {
        category,
        children,
        products,
    }))
}

/// List collections
async fn list_collections(
    State(state): State<CatalogState>,
    Query(query): Query<TaxonomyListQuery>,
) -> ApiResult<Json<ListResponse<Collection>>> {
    let pagination = pagination(&query.page, &query.limit)?;
    if query.parent.is_some() {
        return Err(ApiError::InvalidQueryParam {
            name: "parent",
            reason: "collections are not hierarchical".to_string(),
        });
    }
    let params = ListParams {
        visible: parse_bool("visible", &query.visible)?,
        search: query.search,
        sort: query.sort,
        ..ListParams::collections()
    };

    list_page(&state.store, &params, pagination).await.map(Json)
}

/// Collection detail by slug with its newest products
async fn collection_detail(
    State(state): State<CatalogState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<CollectionDetail>> {
    let collection: Collection = find_by_slug(&state.store, &slug)
        .await?
        .filter(|c: &Collection| c.is_visible)
        .ok_or_else(|| ApiError::not_found("collection", slug.as_str()))?;

    let (filter, order) = build(&ListParams {
        collection_slug: Some(slug),
        ..ListParams::products()
    });
    let products = fetch_many::<Product>(
        state.store.as_ref(),
        &ListQuery::new(filter, order).paginate(i64::from(DEFAULT_LIMIT), 0),
    )
    .await?;

    Ok(Json(CollectionDetail {
        collection,
        products,
    }))
}

/// The theme currently marked active
async fn active_theme(State(state): State<CatalogState>) -> ApiResult<Json<Theme>> {
    let query = ListQuery::new(
        FilterSpec::new().with(Predicate::Active(true)),
        OrderSpec::by(SortField::CreatedAt, Direction::Desc),
    )
    .paginate(1, 0);

    fetch_many::<Theme>(state.store.as_ref(), &query)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("theme", "active"))
}

/// Run a list query and its count side by side
async fn list_page<T: FromRecord>(
    store: &SharedStore,
    params: &ListParams,
    pagination: Pagination,
) -> ApiResult<ListResponse<T>> {
    let (filter, order) = build(params);
    let query = ListQuery::new(filter, order).paginate(pagination.take(), pagination.skip());

    let (data, total) = tokio::try_join!(
        fetch_many::<T>(store.as_ref(), &query),
        store.count(T::KIND, &query.filter),
    )?;

    Ok(ListResponse {
        data,
        page: pagination.page,
        limit: pagination.limit,
        total,
    })
}

async fn find_by_slug<T: FromRecord>(store: &SharedStore, slug: &str) -> ApiResult<Option<T>> {
    let query = ListQuery::new(
        FilterSpec::new().with(Predicate::SlugIn(vec![slug.to_string()])),
        OrderSpec::unordered(),
    )
    .paginate(1, 0);

    Ok(fetch_many::<T>(store.as_ref(), &query)
        .await?
        .into_iter()
        .next())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn pagination(page: &Option<String>, limit: &Option<String>) -> ApiResult<Pagination> {
    Pagination::from_query(non_blank(page), non_blank(limit))
}

fn parse_param<T>(name: &'static str, raw: &Option<String>) -> ApiResult<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    non_blank(raw)
        .map(|value| {
            value
                .parse()
                .map_err(|reason| ApiError::InvalidQueryParam { name, reason })
        })
        .transpose()
}

fn parse_bool(name: &'static str, raw: &Option<String>) -> ApiResult<Option<bool>> {
    non_blank(raw)
        .map(|value| match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ApiError::InvalidQueryParam {
                name,
                reason: format!("expected true or false, got '{}'", value),
            }),
        })
        .transpose()
}
