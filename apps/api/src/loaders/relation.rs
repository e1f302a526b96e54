//! One-to-many batch functions
//!
//! A [`Relation`] describes how children hang off a parent key: which
//! predicate selects them, which fixed predicates and ordering apply, and
//! how to read the parent key back from a row. [`ChildrenOf`] turns any
//! relation into a batch function that issues one `find_many` per batch and
//! groups the rows by parent, keeping the store's order within each group.

use std::collections::HashMap;
use std::marker::PhantomData;

use super::batch::BatchFn;
use super::distinct;
use crate::models::{
    Address, CartItem, Category, Collection, ProductCategory, ProductCollection, Review, Variant,
    VariantSelection,
};
use crate::query::{Direction, FilterSpec, OrderSpec, Predicate, SortField};
use crate::store::{fetch_many, FromRecord, ListQuery, SharedStore, StoreResult};

pub trait Relation: Send + Sync + 'static {
    /// Row type returned by the store
    type Row: FromRecord + Send;
    /// Value handed to callers for each child
    type Item: Clone + Send + Sync + 'static;

    /// Predicate selecting the children of `parents`
    fn parent_filter(parents: Vec<i64>) -> Predicate;

    /// Predicates applied to every fetch
    fn fixed_filter() -> Vec<Predicate> {
        Vec::new()
    }

    fn order() -> OrderSpec;

    fn parent_key(row: &Self::Row) -> i64;

    fn into_item(row: Self::Row) -> Self::Item;
}

/// Children of each parent key, grouped per [`Relation`]
pub struct ChildrenOf<R> {
    store: SharedStore,
    _relation: PhantomData<fn() -> R>,
}

impl<R> ChildrenOf<R> {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            _relation: PhantomData,
        }
    }
}

impl<R: Relation> BatchFn<i64> for ChildrenOf<R> {
    type Value = Vec<R::Item>;

    async fn load(&self, keys: &[i64]) -> StoreResult<Vec<Vec<R::Item>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut filter: FilterSpec = R::fixed_filter().into_iter().collect();
        filter.push(R::parent_filter(distinct(keys)));
        let rows: Vec<R::Row> =
            fetch_many(self.store.as_ref(), &ListQuery::new(filter, R::order())).await?;

        let mut grouped: HashMap<i64, Vec<R::Item>> = HashMap::new();
        for row in rows {
            grouped
                .entry(R::parent_key(&row))
                .or_default()
                .push(R::into_item(row));
        }

        Ok(keys
            .iter()
            .map(|key| grouped.get(key).cloned().unwrap_or_default())
            .collect())
    }
}

/// Variants of a product in display order
pub struct VariantsOfProduct;

impl Relation for VariantsOfProduct {
    type Row = Variant;
    type Item = Variant;

    fn parent_filter(parents: Vec<i64>) -> Predicate {
        Predicate::ProductIdIn(parents)
    }

    fn order() -> OrderSpec {
        OrderSpec::by(SortField::Position, Direction::Asc)
    }

    fn parent_key(row: &Variant) -> i64 {
        row.product_id
    }

    fn into_item(row: Variant) -> Variant {
        row
    }
}

/// Published reviews of a product, newest first
pub struct ReviewsOfProduct;

impl Relation for ReviewsOfProduct {
    type Row = Review;
    type Item = Review;

    fn parent_filter(parents: Vec<i64>) -> Predicate {
        Predicate::ProductIdIn(parents)
    }

    fn fixed_filter() -> Vec<Predicate> {
        vec![Predicate::Published(true)]
    }

    fn order() -> OrderSpec {
        OrderSpec::by(SortField::CreatedAt, Direction::Desc)
    }

    fn parent_key(row: &Review) -> i64 {
        row.product_id
    }

    fn into_item(row: Review) -> Review {
        row
    }
}

/// Visible categories a product is filed under
pub struct CategoriesOfProduct;

impl Relation for CategoriesOfProduct {
    type Row = ProductCategory;
    type Item = Category;

    fn parent_filter(parents: Vec<i64>) -> Predicate {
        Predicate::ProductIdIn(parents)
    }

    fn fixed_filter() -> Vec<Predicate> {
        vec![Predicate::Visible(true)]
    }

    fn order() -> OrderSpec {
        OrderSpec::by(SortField::Position, Direction::Asc)
    }

    fn parent_key(row: &ProductCategory) -> i64 {
        row.product_id
    }

    fn into_item(row: ProductCategory) -> Category {
        row.category
    }
}

/// Visible collections a product belongs to
pub struct CollectionsOfProduct;

impl Relation for CollectionsOfProduct {
    type Row = ProductCollection;
    type Item = Collection;

    fn parent_filter(parents: Vec<i64>) -> Predicate {
        Predicate::ProductIdIn(parents)
    }

    fn fixed_filter() -> Vec<Predicate> {
        vec![Predicate::Visible(true)]
    }

    fn order() -> OrderSpec {
        OrderSpec::by(SortField::Name, Direction::Asc)
    }

    fn parent_key(row: &ProductCollection) -> i64 {
        row.product_id
    }

    fn into_item(row: ProductCollection) -> Collection {
        row.collection
    }
}

/// Addresses of a user, default address first
pub struct AddressesOfUser;

impl Relation for AddressesOfUser {
    type Row = Address;
    type Item = Address;

    fn parent_filter(parents: Vec<i64>) -> Predicate {
        Predicate::UserIdIn(parents)
    }

    fn order() -> OrderSpec {
        OrderSpec::by(SortField::IsDefault, Direction::Desc)
            .then(SortField::CreatedAt, Direction::Desc)
    }

    fn parent_key(row: &Address) -> i64 {
        row.user_id
    }

    fn into_item(row: Address) -> Address {
        row
    }
}

/// Option selections (size, color, ...) of a variant
pub struct SelectionsOfVariant;

impl Relation for SelectionsOfVariant {
    type Row = VariantSelection;
    type Item = VariantSelection;

    fn parent_filter(parents: Vec<i64>) -> Predicate {
        Predicate::VariantIdIn(parents)
    }

    fn order() -> OrderSpec {
        OrderSpec::by(SortField::Id, Direction::Asc)
    }

    fn parent_key(row: &VariantSelection) -> i64 {
        row.variant_id
    }

    fn into_item(row: VariantSelection) -> VariantSelection {
        row
    }
}

/// Line items of a cart, oldest first
pub struct ItemsOfCart;

impl Relation for ItemsOfCart {
    type Row = CartItem;
    type Item = CartItem;

    fn parent_filter(parents: Vec<i64>) -> Predicate {
        Predicate::CartIdIn(parents)
    }

    fn order() -> OrderSpec {
        OrderSpec::by(SortField::CreatedAt, Direction::Asc)
    }

    fn parent_key(row: &CartItem) -> i64 {
        row.cart_id
    }

    fn into_item(row: CartItem) -> CartItem {
        row
    }
}
