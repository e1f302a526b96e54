//! Storage collaborator for the catalog
//!
//! Everything above this module (loaders, REST handlers, GraphQL resolvers)
//! talks to storage through [`CatalogStore`], never through raw SQL. The trait
//! is object safe so a process-wide handle can be shared as [`SharedStore`] and
//! replaced by [`MemoryCatalog`] in tests.

pub mod memory;
pub mod postgres;

pub use memory::{CatalogData, MemoryCatalog, StoreCall};
pub use postgres::PgCatalog;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Address, Cart, CartItem, Category, Collection, Product, ProductCategory, ProductCollection,
    Review, Theme, User, Variant, VariantSelection,
};
use crate::query::{FilterSpec, OrderSpec};

/// Kinds of rows the store can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Variant,
    VariantSelection,
    Category,
    Collection,
    ProductCategory,
    ProductCollection,
    Review,
    User,
    Address,
    Cart,
    CartItem,
    Theme,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Variant => "variant",
            Self::VariantSelection => "variant_selection",
            Self::Category => "category",
            Self::Collection => "collection",
            Self::ProductCategory => "product_category",
            Self::ProductCollection => "product_collection",
            Self::Review => "review",
            Self::User => "user",
            Self::Address => "address",
            Self::Cart => "cart",
            Self::CartItem => "cart_item",
            Self::Theme => "theme",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row returned by the store
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Product(Product),
    Variant(Variant),
    VariantSelection(VariantSelection),
    Category(Category),
    Collection(Collection),
    ProductCategory(ProductCategory),
    ProductCollection(ProductCollection),
    Review(Review),
    User(User),
    Address(Address),
    Cart(Cart),
    CartItem(CartItem),
    Theme(Theme),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Product(_) => EntityKind::Product,
            Self::Variant(_) => EntityKind::Variant,
            Self::VariantSelection(_) => EntityKind::VariantSelection,
            Self::Category(_) => EntityKind::Category,
            Self::Collection(_) => EntityKind::Collection,
            Self::ProductCategory(_) => EntityKind::ProductCategory,
            Self::ProductCollection(_) => EntityKind::ProductCollection,
            Self::Review(_) => EntityKind::Review,
            Self::User(_) => EntityKind::User,
            Self::Address(_) => EntityKind::Address,
            Self::Cart(_) => EntityKind::Cart,
            Self::CartItem(_) => EntityKind::CartItem,
            Self::Theme(_) => EntityKind::Theme,
        }
    }
}

/// Typed access to [`Record`] variants
pub trait FromRecord: Sized {
    const KIND: EntityKind;

    fn from_record(record: Record) -> Option<Self>;
}

/// A row type addressable by its own primary key
pub trait Keyed {
    fn key(&self) -> i64;
}

macro_rules! record_type {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl FromRecord for $ty {
                const KIND: EntityKind = EntityKind::$variant;

                fn from_record(record: Record) -> Option<Self> {
                    match record {
                        Record::$variant(row) => Some(row),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Record {
                fn from(row: $ty) -> Self {
                    Record::$variant(row)
                }
            }
        )*
    };
}

record_type! {
    Product => Product,
    Variant => Variant,
    VariantSelection => VariantSelection,
    Category => Category,
    Collection => Collection,
    ProductCategory => ProductCategory,
    ProductCollection => ProductCollection,
    Review => Review,
    User => User,
    Address => Address,
    Cart => Cart,
    CartItem => CartItem,
    Theme => Theme,
}

macro_rules! keyed_by_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Keyed for $ty {
                fn key(&self) -> i64 {
                    self.id
                }
            }
        )*
    };
}

keyed_by_id!(Product, Variant, Category, Collection, Review, User, Address, Cart, CartItem, Theme);

/// A filtered, ordered, optionally paginated list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: FilterSpec,
    pub order: OrderSpec,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl ListQuery {
    pub fn new(filter: FilterSpec, order: OrderSpec) -> Self {
        Self {
            filter,
            order,
            limit: None,
            skip: None,
        }
    }

    pub fn paginate(mut self, limit: i64, skip: i64) -> Self {
        self.limit = Some(limit);
        self.skip = Some(skip);
        self
    }
}

/// Storage-layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query failed in the database
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The filter uses a predicate the entity kind does not have
    #[error("predicate '{predicate}' is not supported for {kind}")]
    UnsupportedPredicate {
        kind: EntityKind,
        predicate: &'static str,
    },

    /// The ordering uses a field the entity kind does not have
    #[error("cannot sort {kind} by {field}")]
    UnsupportedSort {
        kind: EntityKind,
        field: &'static str,
    },
}

impl StoreError {
    /// Whether the failure is about reaching storage rather than the query itself
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Query interface over the relational catalog
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Fetch rows of `kind` matching a filter, in the requested order
    async fn find_many(&self, kind: EntityKind, query: &ListQuery) -> StoreResult<Vec<Record>>;

    /// Fetch rows of `kind` whose primary key is in `keys`, in no particular order
    async fn find_by_keys(&self, kind: EntityKind, keys: &[i64]) -> StoreResult<Vec<Record>>;

    /// Count rows of `kind` matching a filter
    async fn count(&self, kind: EntityKind, filter: &FilterSpec) -> StoreResult<i64>;

    /// Cheap connectivity check for readiness probes
    async fn ping(&self) -> StoreResult<()>;
}

/// Process-wide store handle
pub type SharedStore = Arc<dyn CatalogStore>;

/// [`CatalogStore::find_many`] with records narrowed to `T`
pub async fn fetch_many<T: FromRecord>(
    store: &dyn CatalogStore,
    query: &ListQuery,
) -> StoreResult<Vec<T>> {
    let records = store.find_many(T::KIND, query).await?;
    Ok(narrow(records))
}

/// [`CatalogStore::find_by_keys`] with records narrowed to `T`
pub async fn fetch_by_keys<T: FromRecord>(
    store: &dyn CatalogStore,
    keys: &[i64],
) -> StoreResult<Vec<T>> {
    let records = store.find_by_keys(T::KIND, keys).await?;
    Ok(narrow(records))
}

fn narrow<T: FromRecord>(records: Vec<Record>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| {
            let kind = record.kind();
            let row = T::from_record(record);
            if row.is_none() {
                tracing::warn!(expected = %T::KIND, got = %kind, "store returned a record of the wrong kind");
            }
            row
        })
        .collect()
}
