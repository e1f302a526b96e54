//! Review model for the Storefront catalog

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Review record from the reviews table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: Option<i64>,
    /// Star rating from 1 to 5
    pub rating: i16,
    pub title: Option<String>,
    pub body: Option<String>,
    /// Unpublished reviews are awaiting moderation
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}
