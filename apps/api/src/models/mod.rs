//! Database models for the Storefront catalog
//!
//! This module contains the SQLx row types for:
//! - Products, variants and their option selections
//! - Categories, collections and the product link tables
//! - Reviews, users and addresses
//! - Carts and themes
//!
//! Prices are persisted as integer cents; [`cents_to_decimal`] is the single
//! conversion point used when a price leaves the API as a decimal number.

pub mod cart;
pub mod product;
pub mod review;
pub mod taxonomy;
pub mod theme;
pub mod user;
pub mod variant;

pub use cart::{Cart, CartItem};
pub use product::{Product, ProductStatus};
pub use review::Review;
pub use taxonomy::{Category, Collection, ProductCategory, ProductCollection};
pub use theme::Theme;
pub use user::{Address, User};
pub use variant::{selection_value, Variant, VariantSelection};

use serde::Serializer;

/// Convert an integer amount of cents into a decimal currency amount
#[inline]
pub fn cents_to_decimal(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub(crate) fn serialize_cents<S>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(cents_to_decimal(*cents))
}

pub(crate) fn serialize_optional_cents<S>(
    cents: &Option<i64>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match cents {
        Some(cents) => serializer.serialize_some(&cents_to_decimal(*cents)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_to_decimal() {
        assert_eq!(cents_to_decimal(1999), 19.99);
        assert_eq!(cents_to_decimal(0), 0.0);
        assert_eq!(cents_to_decimal(-250), -2.5);
    }
}
