//! Single-entity batch functions
//!
//! Each resolves a set of keys with one store call and returns `None` for
//! keys that matched no row.

use std::collections::HashMap;
use std::marker::PhantomData;

use super::batch::BatchFn;
use super::distinct;
use crate::models::Product;
use crate::query::{FilterSpec, OrderSpec, Predicate};
use crate::store::{fetch_by_keys, fetch_many, FromRecord, Keyed, ListQuery, SharedStore, StoreResult};

/// Rows of `T` by primary key
pub struct EntityById<T> {
    store: SharedStore,
    _row: PhantomData<fn() -> T>,
}

impl<T> EntityById<T> {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            _row: PhantomData,
        }
    }
}

impl<T> BatchFn<i64> for EntityById<T>
where
    T: FromRecord + Keyed + Clone + Send + Sync + 'static,
{
    type Value = Option<T>;

    async fn load(&self, keys: &[i64]) -> StoreResult<Vec<Option<T>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<T> = fetch_by_keys(self.store.as_ref(), &distinct(keys)).await?;
        let by_key: HashMap<i64, T> = rows.into_iter().map(|row| (row.key(), row)).collect();

        Ok(keys.iter().map(|key| by_key.get(key).cloned()).collect())
    }
}

/// Products by slug
pub struct ProductBySlug {
    store: SharedStore,
}

impl ProductBySlug {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

impl BatchFn<String> for ProductBySlug {
    type Value = Option<Product>;

    async fn load(&self, keys: &[String]) -> StoreResult<Vec<Option<Product>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let query = ListQuery::new(
            FilterSpec::new().with(Predicate::SlugIn(distinct(keys))),
            OrderSpec::unordered(),
        );
        let rows: Vec<Product> = fetch_many(self.store.as_ref(), &query).await?;
        let by_slug: HashMap<&str, &Product> =
            rows.iter().map(|row| (row.slug.as_str(), row)).collect();

        Ok(keys
            .iter()
            .map(|slug| by_slug.get(slug.as_str()).map(|row| (*row).clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ProductStatus};
    use crate::store::{CatalogData, EntityKind, MemoryCatalog, StoreCall};
    use chrono::Utc;
    use std::sync::Arc;

    fn product(id: i64, slug: &str) -> Product {
        Product {
            id,
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            status: ProductStatus::Published,
            featured: false,
            price_cents: 1000,
            compare_at_cents: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn store() -> Arc<MemoryCatalog> {
        Arc::new(MemoryCatalog::new(CatalogData {
            products: vec![product(1, "tee"), product(3, "cap")],
            ..CatalogData::default()
        }))
    }

    #[tokio::test]
    async fn test_positional_with_duplicates_and_misses() {
        let memory = store();
        let fetch = EntityById::<Product>::new(memory.clone());

        let values = fetch.load(&[1, 2, 1, 3]).await.unwrap();

        let ids: Vec<Option<i64>> = values.iter().map(|p| p.as_ref().map(|p| p.id)).collect();
        assert_eq!(ids, vec![Some(1), None, Some(1), Some(3)]);
        assert_eq!(
            memory.calls(),
            vec![StoreCall::FindByKeys {
                kind: EntityKind::Product,
                keys: vec![1, 2, 3]
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_keys_skip_the_store() {
        let memory = store();
        let fetch = EntityById::<Category>::new(memory.clone());

        assert!(fetch.load(&[]).await.unwrap().is_empty());
        assert!(memory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_product_by_slug() {
        let memory = store();
        let fetch = ProductBySlug::new(memory.clone());

        let values = fetch
            .load(&["cap".to_string(), "scarf".to_string()])
            .await
            .unwrap();

        assert_eq!(values[0].as_ref().map(|p| p.id), Some(3));
        assert!(values[1].is_none());
        assert_eq!(memory.calls_for(EntityKind::Product).len(), 1);
    }
}
