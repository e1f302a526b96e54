//! User and address models for the Storefront catalog

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// User record from the users table
///
/// Credentials live with the auth service and are never selected here.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Shipping/billing address record from the addresses table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}
