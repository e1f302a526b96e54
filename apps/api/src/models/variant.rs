//! Variant model for the Storefront catalog
//!
//! A variant is a purchasable SKU of a product. Its size and color are not
//! columns; they are derived from the `variant_selections` rows attached to it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::serialize_cents;

/// Variant record from the variants table
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    #[serde(rename = "price", serialize_with = "serialize_cents")]
    pub price_cents: i64,
    pub stock: i32,
    /// Display order within the product
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl Variant {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// One option value chosen for a variant (e.g. `size = M`)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSelection {
    pub id: i64,
    pub variant_id: i64,
    pub option_name: String,
    pub value: String,
}

/// Find the value selected for `option_name`, matching the name case-insensitively
pub fn selection_value<'a>(selections: &'a [VariantSelection], option_name: &str) -> Option<&'a str> {
    selections
        .iter()
        .find(|s| s.option_name.eq_ignore_ascii_case(option_name))
        .map(|s| s.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(name: &str, value: &str) -> VariantSelection {
        VariantSelection {
            id: 1,
            variant_id: 7,
            option_name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_selection_value_matches_case_insensitively() {
        let selections = vec![selection("Size", "M"), selection("color", "Navy")];
        assert_eq!(selection_value(&selections, "size"), Some("M"));
        assert_eq!(selection_value(&selections, "COLOR"), Some("Navy"));
        assert_eq!(selection_value(&selections, "material"), None);
    }
}
