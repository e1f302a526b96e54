//! Storefront theme model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Theme record from the themes table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: i64,
    pub name: String,
    /// At most one theme is active at a time
    pub is_active: bool,
    /// Free-form presentation settings (colors, fonts, layout flags)
    #[sqlx(json)]
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
