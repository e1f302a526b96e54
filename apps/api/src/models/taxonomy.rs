//! Category and collection models
//!
//! Categories form a tree through `parent_id`; collections are flat, curated
//! groupings. Products link to both through join tables, which are read back
//! with the linked row included so one query can serve a whole batch of products.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Category record from the categories table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// `None` for root-level categories
    pub parent_id: Option<i64>,
    pub is_visible: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Collection record from the collections table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

/// `product_categories` link row with its category included
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProductCategory {
    pub product_id: i64,
    #[sqlx(flatten)]
    pub category: Category,
}

/// `product_collections` link row with its collection included
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProductCollection {
    pub product_id: i64,
    #[sqlx(flatten)]
    pub collection: Collection,
}
