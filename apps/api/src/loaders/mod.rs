//! Batched loaders for GraphQL resolvers and REST handlers
//!
//! This module provides the per-request loader registry. Each loader batches
//! the lookups issued by independent resolvers into a single store call and
//! caches the results until the request ends.
//!
//! There are two types of loaders:
//! - Single-entity loaders: return `Option<T>` for a single entity by key
//! - Relation loaders: return `Vec<T>` of related entities by parent key

pub mod batch;
pub mod entity;
pub mod relation;

pub use batch::{
    BatchFn, BatchLoader, LoadError, LoaderConfig, DEFAULT_BATCH_DELAY, DEFAULT_MAX_BATCH_SIZE,
};
pub use entity::{EntityById, ProductBySlug};
pub use relation::{
    AddressesOfUser, CategoriesOfProduct, ChildrenOf, CollectionsOfProduct, ItemsOfCart, Relation,
    ReviewsOfProduct, SelectionsOfVariant, VariantsOfProduct,
};

use std::collections::HashSet;
use std::hash::Hash;

use crate::models::{Address, Cart, Category, Collection, Product, User, Variant};
use crate::store::SharedStore;

pub type ById<T> = BatchLoader<i64, EntityById<T>>;
pub type RelationLoader<R> = BatchLoader<i64, ChildrenOf<R>>;

/// Every loader available to one request
///
/// Built fresh for each request and dropped with it; never cloned or shared.
pub struct Loaders {
    pub product: ById<Product>,
    pub product_by_slug: BatchLoader<String, ProductBySlug>,
    pub category: ById<Category>,
    pub collection: ById<Collection>,
    pub variant: ById<Variant>,
    pub user: ById<User>,
    pub address: ById<Address>,
    pub cart: ById<Cart>,
    pub variants_of_product: RelationLoader<VariantsOfProduct>,
    pub reviews_of_product: RelationLoader<ReviewsOfProduct>,
    pub categories_of_product: RelationLoader<CategoriesOfProduct>,
    pub collections_of_product: RelationLoader<CollectionsOfProduct>,
    pub addresses_of_user: RelationLoader<AddressesOfUser>,
    pub selections_of_variant: RelationLoader<SelectionsOfVariant>,
    pub items_of_cart: RelationLoader<ItemsOfCart>,
}

impl Loaders {
    pub fn new(store: SharedStore) -> Self {
        Self::with_config(store, LoaderConfig::default())
    }

    pub fn with_config(store: SharedStore, config: LoaderConfig) -> Self {
        fn by_id<T>(name: &'static str, store: &SharedStore, config: LoaderConfig) -> ById<T>
        where
            T: crate::store::FromRecord + crate::store::Keyed + Clone + Send + Sync + 'static,
        {
            BatchLoader::with_config(name, EntityById::new(store.clone()), config)
        }

        fn children<R: Relation>(
            name: &'static str,
            store: &SharedStore,
            config: LoaderConfig,
        ) -> RelationLoader<R> {
            BatchLoader::with_config(name, ChildrenOf::new(store.clone()), config)
        }

        Self {
            product: by_id("product", &store, config),
            product_by_slug: BatchLoader::with_config(
                "product_by_slug",
                ProductBySlug::new(store.clone()),
                config,
            ),
            category: by_id("category", &store, config),
            collection: by_id("collection", &store, config),
            variant: by_id("variant", &store, config),
            user: by_id("user", &store, config),
            address: by_id("address", &store, config),
            cart: by_id("cart", &store, config),
            variants_of_product: children("variants_of_product", &store, config),
            reviews_of_product: children("reviews_of_product", &store, config),
            categories_of_product: children("categories_of_product", &store, config),
            collections_of_product: children("collections_of_product", &store, config),
            addresses_of_user: children("addresses_of_user", &store, config),
            selections_of_variant: children("selections_of_variant", &store, config),
            items_of_cart: children("items_of_cart", &store, config),
        }
    }

    /// Batch fetches issued across every loader in the registry
    pub fn total_fetches(&self) -> usize {
        [
            self.product.fetch_count(),
            self.product_by_slug.fetch_count(),
            self.category.fetch_count(),
            self.collection.fetch_count(),
            self.variant.fetch_count(),
            self.user.fetch_count(),
            self.address.fetch_count(),
            self.cart.fetch_count(),
            self.variants_of_product.fetch_count(),
            self.reviews_of_product.fetch_count(),
            self.categories_of_product.fetch_count(),
            self.collections_of_product.fetch_count(),
            self.addresses_of_user.fetch_count(),
            self.selections_of_variant.fetch_count(),
            self.items_of_cart.fetch_count(),
        ]
        .iter()
        .sum()
    }
}

impl std::fmt::Debug for Loaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loaders")
            .field("total_fetches", &self.total_fetches())
            .finish_non_exhaustive()
    }
}

/// Distinct keys in first-seen order
pub(crate) fn distinct<K: Eq + Hash + Clone>(keys: &[K]) -> Vec<K> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter()
        .filter(|key| seen.insert(*key))
        .cloned()
        .collect()
}
