//! Theme GraphQL type

use async_graphql::{Json, Object, ID};
use chrono::{DateTime, Utc};

use crate::models::Theme as DbTheme;

/// Storefront look-and-feel settings
pub struct Theme {
    inner: DbTheme,
}

impl From<DbTheme> for Theme {
    fn from(theme: DbTheme) -> Self {
        Self { inner: theme }
    }
}

#[Object]
impl Theme {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn is_active(&self) -> bool {
        self.inner.is_active
    }

    /// Free-form settings document
    async fn settings(&self) -> Json<serde_json::Value> {
        Json(self.inner.settings.clone())
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }
}
