//! Product model for the Storefront catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{serialize_cents, serialize_optional_cents};

/// Publication state matching PostgreSQL `product_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Published,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(format!(
                "unknown status '{}', expected one of draft, published, archived",
                other
            )),
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product record from the products table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Display name, also the target of free-text search
    pub name: String,

    /// URL slug, unique across products
    pub slug: String,

    pub description: Option<String>,

    pub status: ProductStatus,

    pub featured: bool,

    /// Base price in cents
    #[serde(rename = "price", serialize_with = "serialize_cents")]
    pub price_cents: i64,

    /// Strike-through price in cents
    #[serde(rename = "compareAtPrice", serialize_with = "serialize_optional_cents")]
    pub compare_at_cents: Option<i64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product is visible on the public storefront
    pub fn is_published(&self) -> bool {
        self.status == ProductStatus::Published
    }

    /// Whether the product is discounted relative to its compare-at price
    pub fn on_sale(&self) -> bool {
        self.compare_at_cents
            .is_some_and(|compare_at| compare_at > self.price_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("Published".parse::<ProductStatus>(), Ok(ProductStatus::Published));
        assert_eq!("DRAFT".parse::<ProductStatus>(), Ok(ProductStatus::Draft));
        assert!("deleted".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_price_serializes_as_decimal() {
        let now = Utc::now();
        let product = Product {
            id: 1,
            name: "Linen Shirt".to_string(),
            slug: "linen-shirt".to_string(),
            description: None,
            status: ProductStatus::Published,
            featured: false,
            price_cents: 4950,
            compare_at_cents: Some(6000),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], serde_json::json!(49.5));
        assert_eq!(json["compareAtPrice"], serde_json::json!(60.0));
        assert_eq!(json["status"], "published");
        assert!(product.on_sale());
    }
}
