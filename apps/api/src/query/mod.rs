//! List query builder shared by REST list endpoints and GraphQL list fields
//!
//! [`build`] maps a flat set of optional parameters onto a [`FilterSpec`] and an
//! [`OrderSpec`]. It cannot fail: absent parameters add nothing, unknown sort
//! keys fall back to newest-first, and public product lists are always
//! restricted to published products. Pagination and
//! [`ListParams::check_audience`] are validated before a query is built.

mod filter;
mod pagination;

pub use filter::{
    Direction, FilterSpec, OrderSpec, OrderTerm, ParentFilter, Predicate, SortField, SortKey,
};
pub use pagination::{
    clamp_limit, clamp_offset, Pagination, DEFAULT_LIMIT, MAX_LIMIT, MAX_NESTED_LIMIT,
};

use crate::error::{ApiError, ApiResult};
use crate::models::ProductStatus;

/// Who is asking for the list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Audience {
    /// Unauthenticated storefront visitors; only published products are listed
    #[default]
    Public,
    /// Back-office callers that may see every status
    Internal,
}

/// What kind of entity a list query targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListScope {
    #[default]
    Products,
    Categories,
    Collections,
}

/// Optional list parameters, each independently specified
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub scope: ListScope,
    pub audience: Audience,
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
    pub category_slug: Option<String>,
    pub collection_slug: Option<String>,
    pub search: Option<String>,
    pub visible: Option<bool>,
    pub parent: Option<ParentFilter>,
    pub sort: Option<String>,
}

impl ListParams {
    pub fn products() -> Self {
        Self::default()
    }

    pub fn categories() -> Self {
        Self {
            scope: ListScope::Categories,
            ..Self::default()
        }
    }

    pub fn collections() -> Self {
        Self {
            scope: ListScope::Collections,
            ..Self::default()
        }
    }

    /// Reject a status filter the audience may not list
    pub fn check_audience(&self) -> ApiResult<()> {
        match (self.audience, self.status) {
            (Audience::Public, Some(status)) if status != ProductStatus::Published => {
                Err(ApiError::InvalidQueryParam {
                    name: "status",
                    reason: format!("{} products are not listed publicly", status),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Translate list parameters into filter and order specifications
pub fn build(params: &ListParams) -> (FilterSpec, OrderSpec) {
    let mut filter = FilterSpec::new();

    if params.scope == ListScope::Products {
        match (params.audience, params.status) {
            (Audience::Public, _) => filter.push(Predicate::Status(ProductStatus::Published)),
            (Audience::Internal, Some(status)) => filter.push(Predicate::Status(status)),
            (Audience::Internal, None) => {}
        }
    }

    if let Some(featured) = params.featured {
        filter.push(Predicate::Featured(featured));
    }
    if let Some(slug) = non_blank(&params.category_slug) {
        filter.push(Predicate::CategorySlug(slug.to_string()));
    }
    if let Some(slug) = non_blank(&params.collection_slug) {
        filter.push(Predicate::CollectionSlug(slug.to_string()));
    }
    if let Some(text) = non_blank(&params.search) {
        filter.push(Predicate::NameContains(text.to_string()));
    }
    if let Some(visible) = params.visible {
        filter.push(Predicate::Visible(visible));
    }
    if let Some(parent) = params.parent {
        filter.push(Predicate::Parent(parent));
    }

    let order = params
        .sort
        .as_deref()
        .and_then(SortKey::parse)
        .unwrap_or_default()
        .order();

    (filter, order)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
