//! Request-scoped batch loader
//!
//! A [`BatchLoader`] puts an async-graphql [`DataLoader`] in front of a
//! positional [`BatchFn`]. The `DataLoader` collects the keys requested within
//! [`LoaderConfig::delay`] into one call, caches successful values for the
//! lifetime of the loader and hands a failed batch's error to every waiter
//! without caching it. Loaders are created per request and never shared
//! between requests, so the cache needs no invalidation.
//!
//! A key requested again while its batch is still in flight joins that batch
//! instead of being queued for a second fetch.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_graphql::dataloader::{DataLoader, HashMapCache, Loader};
use futures_util::future::{try_join_all, BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::store::StoreError;

/// Default upper bound on keys per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Default wait for sibling keys before a batch is dispatched
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(1);

/// Function that resolves a batch of keys in one round trip
///
/// The returned vector must have the same length as `keys`, with the value for
/// `keys[i]` at position `i`. Absence is expressed in the value type (`None` or
/// an empty `Vec`), never as an error.
pub trait BatchFn<K>: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;

    fn load(
        &self,
        keys: &[K],
    ) -> impl Future<Output = Result<Vec<Self::Value>, StoreError>> + Send;
}

/// Batching tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// How long a batch waits for more keys before it is dispatched
    pub delay: Duration,
    /// A batch is dispatched at once when it holds this many keys
    pub max_batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_BATCH_DELAY,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Errors surfaced to callers of [`BatchLoader::load`]
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The batch fetch failed; every waiter of the batch sees the same cause
    #[error("batch fetch failed: {0}")]
    Fetch(Arc<StoreError>),

    /// The batch resolved a different number of values than it was given keys
    ///
    /// Raised when a [`BatchFn`] returns a list of the wrong length, and when
    /// a dispatched key comes back without a value (`expected: 1, actual: 0`).
    #[error("loader '{loader}' returned {actual} values for {expected} keys")]
    ContractViolation {
        loader: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl LoadError {
    /// Whether the underlying store could not be reached
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_unavailable())
    }
}

/// Keyed [`Loader`] over a positional [`BatchFn`]
struct Positional<F> {
    name: &'static str,
    fetch: F,
    fetches: AtomicUsize,
}

impl<K, F> Loader<K> for Positional<F>
where
    K: Send + Sync + Hash + Eq + Clone + 'static,
    F: BatchFn<K>,
{
    type Value = F::Value;
    type Error = LoadError;

    async fn load(&self, keys: &[K]) -> Result<HashMap<K, Self::Value>, Self::Error> {
        let batch = self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!(loader = self.name, batch, keys = keys.len(), "dispatching batch");

        let values = self.fetch.load(keys).await.map_err(|err| {
            warn!(loader = self.name, batch, keys = keys.len(), error = %err, "batch fetch failed");
            LoadError::Fetch(Arc::new(err))
        })?;

        if values.len() != keys.len() {
            error!(
                loader = self.name,
                batch,
                expected = keys.len(),
                actual = values.len(),
                "batch function broke the positional contract"
            );
            return Err(LoadError::ContractViolation {
                loader: self.name,
                expected: keys.len(),
                actual: values.len(),
            });
        }

        Ok(keys.iter().cloned().zip(values).collect())
    }
}

type PendingLoad<V> = Shared<BoxFuture<'static, Result<Option<V>, LoadError>>>;

/// Per-request cache-and-coalesce loader over a [`BatchFn`]
pub struct BatchLoader<K, F: BatchFn<K>> {
    name: &'static str,
    config: LoaderConfig,
    loader: Arc<DataLoader<Positional<F>, HashMapCache>>,
    /// Loads that have been issued and not yet resolved
    in_flight: Mutex<HashMap<K, PendingLoad<F::Value>>>,
}

impl<K, F> BatchLoader<K, F>
where
    K: Send + Sync + Hash + Eq + Clone + 'static,
    F: BatchFn<K>,
{
    pub fn new(name: &'static str, fetch: F) -> Self {
        Self::with_config(name, fetch, LoaderConfig::default())
    }

    pub fn with_config(name: &'static str, fetch: F, config: LoaderConfig) -> Self {
        let positional = Positional {
            name,
            fetch,
            fetches: AtomicUsize::new(0),
        };
        let loader = DataLoader::with_cache(positional, tokio::spawn, HashMapCache::default())
            .delay(config.delay)
            .max_batch_size(config.max_batch_size.max(1));

        Self {
            name,
            config,
            loader: Arc::new(loader),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve one key, batching it with every other key requested meanwhile
    pub async fn load(&self, key: K) -> Result<F::Value, LoadError> {
        let pending = {
            let mut in_flight = self.lock();
            match in_flight.get(&key) {
                Some(pending) => pending.clone(),
                None => {
                    let loader = self.loader.clone();
                    let dispatched = key.clone();
                    let pending = async move { loader.load_one(dispatched).await }
                        .boxed()
                        .shared();
                    in_flight.insert(key.clone(), pending.clone());
                    pending
                }
            }
        };

        let resolved = pending.clone().await;

        {
            let mut in_flight = self.lock();
            if in_flight.get(&key).is_some_and(|current| current.ptr_eq(&pending)) {
                in_flight.remove(&key);
            }
        }

        resolved?.ok_or(LoadError::ContractViolation {
            loader: self.name,
            expected: 1,
            actual: 0,
        })
    }

    /// Resolve several keys; results are aligned with `keys`
    pub async fn load_many(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<F::Value>, LoadError> {
        try_join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Seed the cache with a value obtained elsewhere
    pub async fn prime(&self, key: K, value: F::Value) {
        self.loader.feed_one(key, value).await;
    }

    /// Number of batch fetches issued so far
    pub fn fetch_count(&self) -> usize {
        self.loader.loader().fetches.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, PendingLoad<F::Value>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, F: BatchFn<K>> fmt::Debug for BatchLoader<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchLoader")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("fetches", &self.loader.loader().fetches.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::AtomicBool;
    use tracing_test::traced_test;

    /// Echoes keys back and records every batch it sees
    #[derive(Default)]
    struct Recording {
        batches: Mutex<Vec<Vec<u32>>>,
        fail: AtomicBool,
        latency: Option<Duration>,
    }

    impl Recording {
        /// Recorded batches, each sorted since batch key order is unspecified
        fn batches(&self) -> Vec<Vec<u32>> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .map(|batch| {
                    let mut batch = batch.clone();
                    batch.sort_unstable();
                    batch
                })
                .collect()
        }
    }

    impl BatchFn<u32> for Arc<Recording> {
        type Value = Option<String>;

        async fn load(&self, keys: &[u32]) -> Result<Vec<Option<String>>, StoreError> {
            self.batches.lock().unwrap().push(keys.to_vec());
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            Ok(keys
                .iter()
                .map(|k| (k % 2 == 1).then(|| format!("row-{k}")))
                .collect())
        }
    }

    /// Drops the last value of every batch
    struct ShortChanged;

    impl BatchFn<u32> for ShortChanged {
        type Value = u32;

        async fn load(&self, keys: &[u32]) -> Result<Vec<u32>, StoreError> {
            Ok(keys.iter().skip(1).copied().collect())
        }
    }

    fn loader(config: LoaderConfig) -> (BatchLoader<u32, Arc<Recording>>, Arc<Recording>) {
        let fetch = Arc::new(Recording::default());
        (
            BatchLoader::with_config("recording", fetch.clone(), config),
            fetch,
        )
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let (loader, fetch) = loader(LoaderConfig::default());

        let (a, b, c) = tokio::join!(loader.load(1), loader.load(3), loader.load(1));

        assert_eq!(a.unwrap().as_deref(), Some("row-1"));
        assert_eq!(b.unwrap().as_deref(), Some("row-3"));
        assert_eq!(c.unwrap().as_deref(), Some("row-1"));
        assert_eq!(fetch.batches(), vec![vec![1, 3]]);
        assert_eq!(loader.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_load_many_is_positional() {
        let (loader, fetch) = loader(LoaderConfig::default());

        let values = loader.load_many([1, 2, 1, 5]).await.unwrap();

        assert_eq!(
            values,
            vec![
                Some("row-1".to_string()),
                None,
                Some("row-1".to_string()),
                Some("row-5".to_string()),
            ]
        );
        assert_eq!(fetch.batches(), vec![vec![1, 2, 5]]);
    }

    #[tokio::test]
    async fn test_cached_keys_skip_the_fetch() {
        let (loader, fetch) = loader(LoaderConfig::default());

        let first = loader.load(7).await.unwrap();
        let second = loader.load(7).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetch.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_later_loads_start_a_new_batch() {
        let (loader, fetch) = loader(LoaderConfig::default());

        loader.load_many([1, 2]).await.unwrap();
        loader.load_many([2, 3]).await.unwrap();

        assert_eq!(fetch.batches(), vec![vec![1, 2], vec![3]]);
    }

    #[tokio::test]
    async fn test_key_requested_while_in_flight_joins_its_batch() {
        let fetch = Arc::new(Recording {
            latency: Some(Duration::from_millis(50)),
            ..Recording::default()
        });
        let loader = BatchLoader::new("slow", fetch.clone());

        let late = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tokio::join!(loader.load(1), loader.load(3))
        };
        let (first, (again, other)) = tokio::join!(loader.load(1), late);

        assert_eq!(first.unwrap().as_deref(), Some("row-1"));
        assert_eq!(again.unwrap().as_deref(), Some("row-1"));
        assert_eq!(other.unwrap().as_deref(), Some("row-3"));
        assert_eq!(fetch.batches(), vec![vec![1], vec![3]]);
        assert_eq!(loader.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter_and_is_not_cached() {
        let (loader, fetch) = loader(LoaderConfig::default());
        fetch.fail.store(true, Ordering::SeqCst);

        let (a, b) = tokio::join!(loader.load(1), loader.load(2));
        let (Err(LoadError::Fetch(a)), Err(LoadError::Fetch(b))) = (a, b) else {
            panic!("both waiters should see the fetch failure");
        };
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_unavailable());

        fetch.fail.store(false, Ordering::SeqCst);
        assert_eq!(loader.load(1).await.unwrap().as_deref(), Some("row-1"));
        assert_eq!(fetch.batches(), vec![vec![1, 2], vec![1]]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_length_mismatch_is_a_contract_violation() {
        let loader = BatchLoader::new("short", ShortChanged);

        let result = loader.load_many([4, 5, 6]).await;

        assert_matches!(
            result,
            Err(LoadError::ContractViolation {
                loader: "short",
                expected: 3,
                actual: 2
            })
        );
        assert!(logs_contain("batch function broke the positional contract"));
    }

    #[tokio::test]
    async fn test_contract_violation_is_not_cached() {
        let loader = BatchLoader::new("short", ShortChanged);

        assert!(loader.load(4).await.is_err());
        assert!(loader.load(4).await.is_err());
        assert_eq!(loader.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_max_batch_size_splits_batches() {
        let (loader, fetch) = loader(LoaderConfig {
            max_batch_size: 2,
            ..LoaderConfig::default()
        });

        let values = loader.load_many([1, 3, 5, 7, 9]).await.unwrap();

        assert_eq!(values.len(), 5);
        let batches = fetch.batches();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|batch| batch.len() <= 2));
        let mut keys = batches.concat();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 3, 5, 7, 9]);
    }

    #[tokio::test]
    async fn test_delay_collects_keys_across_ticks() {
        let (loader, fetch) = loader(LoaderConfig {
            delay: Duration::from_millis(30),
            ..LoaderConfig::default()
        });

        let late = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            loader.load(3).await
        };
        let (a, b) = tokio::join!(loader.load(1), late);

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(fetch.batches(), vec![vec![1, 3]]);
    }

    #[tokio::test]
    async fn test_primed_value_is_served_from_cache() {
        let (loader, fetch) = loader(LoaderConfig::default());
        loader.prime(2, Some("primed".to_string())).await;

        assert_eq!(loader.load(2).await.unwrap().as_deref(), Some("primed"));
        assert!(fetch.batches().is_empty());
    }

    #[tokio::test]
    async fn test_separate_loaders_do_not_share_a_cache() {
        let fetch = Arc::new(Recording::default());
        let first = BatchLoader::new("first", fetch.clone());
        let second = BatchLoader::new("second", fetch.clone());

        first.load(1).await.unwrap();
        second.load(1).await.unwrap();

        assert_eq!(fetch.batches(), vec![vec![1], vec![1]]);
    }
}
