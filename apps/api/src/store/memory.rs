//! In-memory implementation of [`CatalogStore`]
//!
//! Applies the same predicate and ordering semantics as [`PgCatalog`](super::PgCatalog)
//! over plain vectors. Every call is recorded so tests can assert exactly which
//! fetches a piece of code issued, and a failure can be injected to simulate an
//! unreachable database.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CatalogStore, EntityKind, ListQuery, Record, StoreError, StoreResult};
use crate::models::{
    Address, Cart, CartItem, Category, Collection, Product, ProductCategory, ProductCollection,
    Review, Theme, User, Variant, VariantSelection,
};
use crate::query::{Direction, FilterSpec, ParentFilter, Predicate, SortField};

/// Raw catalog tables
#[derive(Debug, Clone, Default)]
pub struct CatalogData {
    pub products: Vec<Product>,
    pub variants: Vec<Variant>,
    pub variant_selections: Vec<VariantSelection>,
    pub categories: Vec<Category>,
    pub collections: Vec<Collection>,
    /// `(product_id, category_id)` pairs
    pub product_categories: Vec<(i64, i64)>,
    /// `(product_id, collection_id)` pairs
    pub product_collections: Vec<(i64, i64)>,
    pub reviews: Vec<Review>,
    pub users: Vec<User>,
    pub addresses: Vec<Address>,
    pub carts: Vec<Cart>,
    pub cart_items: Vec<CartItem>,
    pub themes: Vec<Theme>,
}

impl CatalogData {
    fn records(&self, kind: EntityKind) -> Vec<Record> {
        fn wrap<T: Clone + Into<Record>>(rows: &[T]) -> Vec<Record> {
            rows.iter().cloned().map(Into::into).collect()
        }

        match kind {
            EntityKind::Product => wrap(&self.products),
            EntityKind::Variant => wrap(&self.variants),
            EntityKind::VariantSelection => wrap(&self.variant_selections),
            EntityKind::Category => wrap(&self.categories),
            EntityKind::Collection => wrap(&self.collections),
            EntityKind::ProductCategory => self
                .product_categories
                .iter()
                .filter_map(|(product_id, category_id)| {
                    self.categories
                        .iter()
                        .find(|c| c.id == *category_id)
                        .map(|category| {
                            Record::ProductCategory(ProductCategory {
                                product_id: *product_id,
                                category: category.clone(),
                            })
                        })
                })
                .collect(),
            EntityKind::ProductCollection => self
                .product_collections
                .iter()
                .filter_map(|(product_id, collection_id)| {
                    self.collections
                        .iter()
                        .find(|c| c.id == *collection_id)
                        .map(|collection| {
                            Record::ProductCollection(ProductCollection {
                                product_id: *product_id,
                                collection: collection.clone(),
                            })
                        })
                })
                .collect(),
            EntityKind::Review => wrap(&self.reviews),
            EntityKind::User => wrap(&self.users),
            EntityKind::Address => wrap(&self.addresses),
            EntityKind::Cart => wrap(&self.carts),
            EntityKind::CartItem => wrap(&self.cart_items),
            EntityKind::Theme => wrap(&self.themes),
        }
    }

    fn product_in_category(&self, product_id: i64, slug: &str) -> bool {
        self.product_categories.iter().any(|(p, c)| {
            *p == product_id
                && self
                    .categories
                    .iter()
                    .any(|category| category.id == *c && category.slug == slug)
        })
    }

    fn product_in_collection(&self, product_id: i64, slug: &str) -> bool {
        self.product_collections.iter().any(|(p, c)| {
            *p == product_id
                && self
                    .collections
                    .iter()
                    .any(|collection| collection.id == *c && collection.slug == slug)
        })
    }

    /// Evaluate one predicate, `None` when it does not apply to the record's kind
    fn matches(&self, record: &Record, predicate: &Predicate) -> Option<bool> {
        use Predicate as P;
        use Record as R;

        let matched = match (predicate, record) {
            (P::IdIn(ids), record) => ids.contains(&record_id(record)?),
            (P::SlugIn(slugs), R::Product(p)) => slugs.contains(&p.slug),
            (P::SlugIn(slugs), R::Category(c)) => slugs.contains(&c.slug),
            (P::SlugIn(slugs), R::Collection(c)) => slugs.contains(&c.slug),
            (P::SlugIn(slugs), R::ProductCategory(l)) => slugs.contains(&l.category.slug),
            (P::SlugIn(slugs), R::ProductCollection(l)) => slugs.contains(&l.collection.slug),
            (P::Status(status), R::Product(p)) => p.status == *status,
            (P::Featured(flag), R::Product(p)) => p.featured == *flag,
            (P::CategorySlug(slug), R::Product(p)) => self.product_in_category(p.id, slug),
            (P::CollectionSlug(slug), R::Product(p)) => self.product_in_collection(p.id, slug),
            (P::NameContains(text), record) => {
                contains_ignore_case(record_name(record)?, text)
            }
            (P::Visible(flag), R::Category(c)) => c.is_visible == *flag,
            (P::Visible(flag), R::Collection(c)) => c.is_visible == *flag,
            (P::Visible(flag), R::ProductCategory(l)) => l.category.is_visible == *flag,
            (P::Visible(flag), R::ProductCollection(l)) => l.collection.is_visible == *flag,
            (P::Parent(parent), R::Category(c)) => parent_matches(c.parent_id, parent),
            (P::Parent(parent), R::ProductCategory(l)) => {
                parent_matches(l.category.parent_id, parent)
            }
            (P::ProductIdIn(ids), R::Variant(v)) => ids.contains(&v.product_id),
            (P::ProductIdIn(ids), R::Review(r)) => ids.contains(&r.product_id),
            (P::ProductIdIn(ids), R::ProductCategory(l)) => ids.contains(&l.product_id),
            (P::ProductIdIn(ids), R::ProductCollection(l)) => ids.contains(&l.product_id),
            (P::VariantIdIn(ids), R::VariantSelection(s)) => ids.contains(&s.variant_id),
            (P::VariantIdIn(ids), R::CartItem(i)) => ids.contains(&i.variant_id),
            (P::UserIdIn(ids), R::Address(a)) => ids.contains(&a.user_id),
            (P::UserIdIn(ids), R::Cart(c)) => c.user_id.is_some_and(|id| ids.contains(&id)),
            (P::UserIdIn(ids), R::Review(r)) => r.user_id.is_some_and(|id| ids.contains(&id)),
            (P::CartIdIn(ids), R::CartItem(i)) => ids.contains(&i.cart_id),
            (P::Published(flag), R::Review(r)) => r.is_published == *flag,
            (P::Active(flag), R::Theme(t)) => t.is_active == *flag,
            _ => return None,
        };
        Some(matched)
    }
}

fn parent_matches(parent_id: Option<i64>, filter: &ParentFilter) -> bool {
    match filter {
        ParentFilter::Root => parent_id.is_none(),
        ParentFilter::Id(id) => parent_id == Some(*id),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn record_id(record: &Record) -> Option<i64> {
    Some(match record {
        Record::Product(r) => r.id,
        Record::Variant(r) => r.id,
        Record::VariantSelection(r) => r.id,
        Record::Category(r) => r.id,
        Record::Collection(r) => r.id,
        Record::ProductCategory(r) => r.category.id,
        Record::ProductCollection(r) => r.collection.id,
        Record::Review(r) => r.id,
        Record::User(r) => r.id,
        Record::Address(r) => r.id,
        Record::Cart(r) => r.id,
        Record::CartItem(r) => r.id,
        Record::Theme(r) => r.id,
    })
}

fn record_name(record: &Record) -> Option<&str> {
    match record {
        Record::Product(r) => Some(&r.name),
        Record::Variant(r) => Some(&r.name),
        Record::Category(r) => Some(&r.name),
        Record::Collection(r) => Some(&r.name),
        Record::ProductCategory(r) => Some(&r.category.name),
        Record::ProductCollection(r) => Some(&r.collection.name),
        Record::Theme(r) => Some(&r.name),
        _ => None,
    }
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue<'a> {
    Int(i64),
    Text(&'a str),
    Time(DateTime<Utc>),
    Flag(bool),
}

fn sort_value(record: &Record, field: SortField) -> Option<SortValue<'_>> {
    use Record as R;
    use SortValue as V;

    match (field, record) {
        (SortField::Id, record) => record_id(record).map(V::Int),
        (SortField::Name, record) => record_name(record).map(V::Text),
        (SortField::CreatedAt, R::Product(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::Variant(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::Category(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::Collection(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::ProductCategory(r)) => Some(V::Time(r.category.created_at)),
        (SortField::CreatedAt, R::ProductCollection(r)) => {
            Some(V::Time(r.collection.created_at))
        }
        (SortField::CreatedAt, R::Review(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::User(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::Address(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::Cart(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::CartItem(r)) => Some(V::Time(r.created_at)),
        (SortField::CreatedAt, R::Theme(r)) => Some(V::Time(r.created_at)),
        (SortField::Price, R::Product(r)) => Some(V::Int(r.price_cents)),
        (SortField::Price, R::Variant(r)) => Some(V::Int(r.price_cents)),
        (SortField::Position, R::Variant(r)) => Some(V::Int(i64::from(r.position))),
        (SortField::Position, R::Category(r)) => Some(V::Int(i64::from(r.position))),
        (SortField::Position, R::ProductCategory(r)) => {
            Some(V::Int(i64::from(r.category.position)))
        }
        (SortField::IsDefault, R::Address(r)) => Some(V::Flag(r.is_default)),
        _ => None,
    }
}

/// One call made against a [`MemoryCatalog`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FindMany { kind: EntityKind, query: ListQuery },
    FindByKeys { kind: EntityKind, keys: Vec<i64> },
    Count { kind: EntityKind, filter: FilterSpec },
}

impl StoreCall {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::FindMany { kind, .. } | Self::FindByKeys { kind, .. } | Self::Count { kind, .. } => {
                *kind
            }
        }
    }
}

/// Catalog store over in-memory tables
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    data: RwLock<CatalogData>,
    calls: Mutex<Vec<StoreCall>>,
    failure: Mutex<Option<String>>,
}

impl MemoryCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Apply a change to the stored tables
    pub fn mutate<R>(&self, change: impl FnOnce(&mut CatalogData) -> R) -> R {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut data)
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls_guard().clone()
    }

    /// Calls made for one entity kind
    pub fn calls_for(&self, kind: EntityKind) -> Vec<StoreCall> {
        self.calls_guard()
            .iter()
            .filter(|call| call.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls_guard().clear();
    }

    /// Make every subsequent call fail as if the database were unreachable
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Undo [`MemoryCatalog::fail_with`]
    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn calls_guard(&self) -> MutexGuard<'_, Vec<StoreCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self, call: StoreCall) -> StoreResult<()> {
        tracing::debug!(call = ?call, "memory catalog call");
        self.calls_guard().push(call);
        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn filtered(&self, kind: EntityKind, filter: &FilterSpec) -> StoreResult<Vec<Record>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows = Vec::new();
        for record in data.records(kind) {
            let mut keep = true;
            for predicate in filter.predicates() {
                let matched =
                    data.matches(&record, predicate)
                        .ok_or(StoreError::UnsupportedPredicate {
                            kind,
                            predicate: predicate.name(),
                        })?;
                keep &= matched;
            }
            if keep {
                rows.push(record);
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_many(&self, kind: EntityKind, query: &ListQuery) -> StoreResult<Vec<Record>> {
        self.record_call(StoreCall::FindMany {
            kind,
            query: query.clone(),
        })?;

        let mut rows = self.filtered(kind, &query.filter)?;

        for term in query.order.terms() {
            if rows
                .first()
                .is_some_and(|row| sort_value(row, term.field).is_none())
            {
                return Err(StoreError::UnsupportedSort {
                    kind,
                    field: term.field.as_str(),
                });
            }
        }
        rows.sort_by(|a, b| {
            for term in query.order.terms() {
                let ordering = sort_value(a, term.field)
                    .partial_cmp(&sort_value(b, term.field))
                    .unwrap_or(Ordering::Equal);
                let ordering = match term.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            record_id(a).cmp(&record_id(b))
        });

        let skip = query.skip.unwrap_or(0).max(0) as usize;
        let rows = rows.into_iter().skip(skip);
        Ok(match query.limit {
            Some(limit) => rows.take(limit.max(0) as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn find_by_keys(&self, kind: EntityKind, keys: &[i64]) -> StoreResult<Vec<Record>> {
        self.record_call(StoreCall::FindByKeys {
            kind,
            keys: keys.to_vec(),
        })?;
        self.filtered(kind, &FilterSpec::new().with(Predicate::IdIn(keys.to_vec())))
    }

    async fn count(&self, kind: EntityKind, filter: &FilterSpec) -> StoreResult<i64> {
        self.record_call(StoreCall::Count {
            kind,
            filter: filter.clone(),
        })?;
        Ok(self.filtered(kind, filter)?.len() as i64)
    }

    async fn ping(&self) -> StoreResult<()> {
        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}
