//! Per-garden result cache for harvest statistics.
//!
//! Loading a garden means fetching and parsing its sheet, then
//! aggregating it. The cache memoizes the result per [`GardenKey`] so a
//! garden is loaded at most once while it stays cached.
//!
//! # Architecture
//!
//! - `Arc<Mutex<CacheState>>` wrapper so clones share one cache across tasks
//! - the lock is only held for lookup-or-insert, never across an `.await`
//! - an in-flight load is a [`Shared`] future stored under its key; a
//!   second request for the same key awaits that future instead of
//!   starting another load
//! - failed loads are handed to every waiter but never stored, so the
//!   next request retries
//! - entries are evicted oldest-inserted-first once the capacity is exceeded
//!
//! # Usage
//!
//! ```rust
//! use jdn_cache::{CacheEntry, GardenCache};
//! use jdn_core::{GardenKey, HarvestSheet};
//! use jdn_data::YearRange;
//!
//! # futures::executor::block_on(async {
//! let cache = GardenCache::new(50);
//! let key = GardenKey::from_name("Jardin des Deux Rives");
//! let loader_key = key.clone();
//! let entry = cache
//!     .get_or_load(&key, move || async move {
//!         let sheet = HarvestSheet::parse_csv("stats.csv", "Variétés,2020\nTomate,1200\n")?;
//!         Ok(CacheEntry::from_sheet(loader_key, sheet, YearRange::default()))
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(entry.variety_totals.get("Tomate"), Some(1200.0));
//! assert!(cache.get(&key).is_some());
//! # });
//! ```

mod entry;

pub use entry::CacheEntry;

use futures::future::{BoxFuture, FutureExt, Shared};
use jdn_core::error::Result;
use jdn_core::garden_key::GardenKey;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default maximum number of cached gardens.
pub const DEFAULT_CAPACITY: usize = 50;

type PendingLoad = Shared<BoxFuture<'static, Result<Arc<CacheEntry>>>>;

/// Counters describing cache activity since creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<GardenKey, Arc<CacheEntry>>,
    /// Keys in insertion order, oldest first
    order: VecDeque<GardenKey>,
    pending: HashMap<GardenKey, PendingLoad>,
    hits: u64,
    misses: u64,
    loads: u64,
    evictions: u64,
}

impl CacheState {
    fn insert(&mut self, key: GardenKey, entry: Arc<CacheEntry>) {
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push_back(key);
        }
    }

    fn evict_over(&mut self, max_entries: usize) -> usize {
        let mut evicted = 0;
        while self.entries.len() > max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.entries.remove(&oldest).is_some() {
                debug!("cache: evicted {}", oldest);
                evicted += 1;
            }
        }
        self.evictions += evicted as u64;
        evicted
    }
}

/// Memoized garden statistics, shared by cloning.
#[derive(Clone)]
pub struct GardenCache {
    state: Arc<Mutex<CacheState>>,
    capacity: usize,
}

impl GardenCache {
    /// Create an empty cache holding at most `capacity` gardens (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // a panicking holder cannot leave the maps half-updated
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a cached entry without loading or touching counters.
    pub fn get(&self, key: &GardenKey) -> Option<Arc<CacheEntry>> {
        self.lock().entries.get(key).cloned()
    }

    /// Return the cached entry for `key`, loading it with `loader` if needed.
    ///
    /// `loader` is called at most once per key while a load is in flight:
    /// concurrent callers for the same key wait on the same result. A
    /// failed load is returned to every waiter and not cached.
    pub async fn get_or_load<F, Fut>(&self, key: &GardenKey, loader: F) -> Result<Arc<CacheEntry>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheEntry>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();
            if let Some(entry) = state.entries.get(key) {
                let entry = Arc::clone(entry);
                state.hits += 1;
                debug!("cache: hit {}", key);
                return Ok(entry);
            }
            state.misses += 1;
            match state.pending.get(key) {
                Some(in_flight) => {
                    debug!("cache: joining in-flight load of {}", key);
                    in_flight.clone()
                }
                None => {
                    info!("cache: loading {}", key);
                    state.loads += 1;
                    let load = loader().map(|result| result.map(Arc::new)).boxed().shared();
                    state.pending.insert(key.clone(), load.clone());
                    load
                }
            }
        };

        let outcome = pending.clone().await;

        let mut state = self.lock();
        // only the first waiter to wake settles the slot, and only if a
        // newer load has not replaced it meanwhile
        let settles = state
            .pending
            .get(key)
            .is_some_and(|current| current.ptr_eq(&pending));
        if settles {
            state.pending.remove(key);
            match &outcome {
                Ok(entry) => {
                    state.insert(key.clone(), Arc::clone(entry));
                    state.evict_over(self.capacity);
                }
                Err(e) => warn!("cache: load of {} failed, not cached: {}", key, e),
            }
        }
        outcome
    }

    /// Remove oldest-inserted entries until at most `max_entries` remain.
    ///
    /// Returns the number of entries removed.
    pub fn evict_if_over_capacity(&self, max_entries: usize) -> usize {
        let evicted = self.lock().evict_over(max_entries);
        if evicted > 0 {
            info!("cache: evicted {} entries", evicted);
        }
        evicted
    }

    /// Cached keys, oldest first.
    pub fn keys(&self) -> Vec<GardenKey> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter(|key| state.entries.contains_key(*key))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop every cached entry. In-flight loads still complete.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            in_flight: state.pending.len(),
            hits: state.hits,
            misses: state.misses,
            loads: state.loads,
            evictions: state.evictions,
        }
    }
}

impl Default for GardenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdn_core::error::GardenError;
    use jdn_core::harvest::{HarvestRow, HarvestSheet};
    use jdn_data::aggregation::YearRange;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn entry_for(key: &GardenKey) -> CacheEntry {
        let sheet = HarvestSheet {
            columns: vec!["variety".into(), "2020".into()],
            raw_columns: vec!["Variétés".into(), "2020".into()],
            rows: vec![HarvestRow::from_cells([("variety", "Tomate"), ("2020", "1200")])],
        };
        CacheEntry::from_sheet(key.clone(), sheet, YearRange::default())
    }

    fn counting_loader(
        key: &GardenKey,
        calls: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<CacheEntry>> {
        let key = key.clone();
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(entry_for(&key))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_collapse() {
        let cache = GardenCache::new(10);
        let key = GardenKey::from_name("jardin x");
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_load(&key, counting_loader(&key, &calls)),
            cache.get_or_load(&key, counting_loader(&key, &calls)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn test_concurrent_loads_across_tasks() {
        let cache = GardenCache::new(10);
        let key = GardenKey::from_name("jardin x");
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_load(&key, counting_loader(&key, &calls))
                        .await
                        .map(|entry| entry.variety_totals.total())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(1200.0));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_entry_is_returned_without_loading() {
        let cache = GardenCache::new(10);
        let key = GardenKey::from_name("Jardin X");
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_load(&key, counting_loader(&key, &calls)).await.unwrap();
        cache.get_or_load(&key, counting_loader(&key, &calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.loads), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = GardenCache::new(10);
        let key = GardenKey::from_name("Jardin X");
        let attempts = Arc::new(AtomicUsize::new(0));

        let failing = {
            let attempts = Arc::clone(&attempts);
            move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<CacheEntry, _>(GardenError::TransientNetwork {
                    origin: "stats_Jardin_X.csv".into(),
                    message: "connection reset".into(),
                })
            }
        };
        let result = cache.get_or_load(&key, failing).await;
        assert!(matches!(result, Err(GardenError::TransientNetwork { .. })));
        assert!(cache.get(&key).is_none());

        let entry = cache
            .get_or_load(&key, counting_loader(&key, &attempts))
            .await
            .unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(entry.key, key);
    }

    #[tokio::test]
    async fn test_inserting_past_capacity_evicts_oldest() {
        let cache = GardenCache::new(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let keys: Vec<GardenKey> = ["Jardin A", "Jardin B", "Jardin C", "Jardin D"]
            .iter()
            .map(|name| GardenKey::from_name(name))
            .collect();
        for key in &keys {
            cache.get_or_load(key, counting_loader(key, &calls)).await.unwrap();
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&keys[0]).is_none());
        assert_eq!(cache.keys(), keys[1..].to_vec());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_evict_if_over_capacity() {
        let cache = GardenCache::new(10);
        let calls = Arc::new(AtomicUsize::new(0));
        for name in ["Jardin A", "Jardin B", "Jardin C", "Jardin D"] {
            let key = GardenKey::from_name(name);
            cache.get_or_load(&key, counting_loader(&key, &calls)).await.unwrap();
        }

        assert_eq!(cache.evict_if_over_capacity(4), 0);
        assert_eq!(cache.evict_if_over_capacity(2), 2);
        assert_eq!(
            cache.keys(),
            vec![GardenKey::from_name("Jardin C"), GardenKey::from_name("Jardin D")]
        );
    }

    #[tokio::test]
    async fn test_get_has_no_side_effect() {
        let cache = GardenCache::new(10);
        let key = GardenKey::from_name("Jardin X");
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = GardenCache::default();
        let key = GardenKey::from_name("Jardin X");
        let calls = Arc::new(AtomicUsize::new(0));
        cache.get_or_load(&key, counting_loader(&key, &calls)).await.unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
    }
}
