//! Category and collection GraphQL types

use async_graphql::{Context, Object, Result, ID};

use crate::error::gql_error;
use crate::graphql::loaders;
use crate::models::{Category as DbCategory, Collection as DbCollection};

/// Node in the category tree
pub struct Category {
    inner: DbCategory,
}

impl From<DbCategory> for Category {
    fn from(category: DbCategory) -> Self {
        Self { inner: category }
    }
}

#[Object]
impl Category {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn slug(&self) -> &str {
        &self.inner.slug
    }

    async fn is_visible(&self) -> bool {
        self.inner.is_visible
    }

    async fn position(&self) -> i32 {
        self.inner.position
    }

    /// Parent category, absent at the root
    async fn parent(&self, ctx: &Context<'_>) -> Result<Option<Category>> {
        let Some(parent_id) = self.inner.parent_id else {
            return Ok(None);
        };
        let parent = loaders(ctx)?
            .category
            .load(parent_id)
            .await
            .map_err(gql_error)?;
        Ok(parent.map(Category::from))
    }
}

/// Curated product grouping
pub struct Collection {
    inner: DbCollection,
}

impl From<DbCollection> for Collection {
    fn from(collection: DbCollection) -> Self {
        Self { inner: collection }
    }
}

#[Object]
impl Collection {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn slug(&self) -> &str {
        &self.inner.slug
    }

    async fn is_visible(&self) -> bool {
        self.inner.is_visible
    }
}
