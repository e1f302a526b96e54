//! GraphQL type definitions
//!
//! Each type wraps its database model. Relationship fields resolve through the
//! request's loader registry, so a list of N products costs one fetch per
//! relation rather than N.

mod customer;
mod product;
mod taxonomy;
mod theme;

pub use customer::{Address, Cart, CartItem, User};
pub use product::{Product, ProductFilter, ProductPage, ProductStatus, Review, Variant, VariantOption};
pub use taxonomy::{Category, Collection};
pub use theme::Theme;
