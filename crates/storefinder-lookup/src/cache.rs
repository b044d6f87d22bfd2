//! Refresh-ahead cache of each brand's full store list.
//!
//! Every `(brand, marketplace)` key moves through
//! `Absent -> Loading -> Fresh -> Stale -> Refreshing -> Fresh`. A stale entry
//! keeps being served while one background task reloads it; if that reload
//! fails the stale list stays in place until the next stale read tries again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use storefinder_core::{EventSink, StoreEvent, StoreRecord};
use storefinder_directory::{DirectoryError, StoreDirectory};
use tokio::sync::Semaphore;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub brand_id: String,
    pub marketplace_id: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(brand_id: &str, marketplace_id: &str) -> Self {
        Self {
            brand_id: brand_id.to_string(),
            marketplace_id: marketplace_id.to_string(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.brand_id, self.marketplace_id)
    }
}

/// Observable state of one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    /// First load in flight; nothing to serve yet.
    Loading,
    Fresh,
    /// Past its TTL, served as-is until a refresh is scheduled.
    Stale,
    /// Past its TTL with a background reload in flight.
    Refreshing,
}

#[derive(Clone)]
struct Snapshot {
    stores: Arc<[StoreRecord]>,
    loaded_at: Instant,
}

#[derive(Default)]
struct Slot {
    /// Serializes cold loads so concurrent first readers share one call.
    cold_load: tokio::sync::Mutex<()>,
    loading: AtomicBool,
    refreshing: AtomicBool,
    snapshot: RwLock<Option<Snapshot>>,
}

impl Slot {
    fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, stores: Arc<[StoreRecord]>) {
        let snapshot = Snapshot {
            stores,
            loaded_at: Instant::now(),
        };
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }
}

/// Clears an in-flight flag when dropped, including when the owning future is
/// cancelled.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

type Slots = Mutex<HashMap<CacheKey, Arc<Slot>>>;

/// Removes a key whose cold load ended without a store list, once no other
/// caller holds its slot. Runs on failure and on cancellation alike.
struct EvictUnloaded<'a> {
    slots: &'a Slots,
    key: &'a CacheKey,
    slot: &'a Arc<Slot>,
}

impl Drop for EvictUnloaded<'_> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under this lock: one is the map's, one is ours.
        if self.slot.snapshot().is_none()
            && Arc::strong_count(self.slot) <= 2
            && slots
                .get(self.key)
                .is_some_and(|current| Arc::ptr_eq(current, self.slot))
        {
            slots.remove(self.key);
        }
    }
}

struct Inner<D> {
    directory: Arc<D>,
    ttl: Duration,
    refresh_permits: Semaphore,
    events: Arc<dyn EventSink>,
    slots: Slots,
}

/// Per-brand store list cache backed by [`StoreDirectory::list_all_for_brand`].
///
/// Cloning is cheap; clones share the same entries.
pub struct BrandStoreCache<D> {
    inner: Arc<Inner<D>>,
}

impl<D> Clone for BrandStoreCache<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> BrandStoreCache<D>
where
    D: StoreDirectory + 'static,
{
    /// `refresh_concurrency` bounds how many background reloads run at once
    /// across all keys; it is clamped to at least one.
    #[must_use]
    pub fn new(
        directory: Arc<D>,
        ttl: Duration,
        refresh_concurrency: usize,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                directory,
                ttl,
                refresh_permits: Semaphore::new(refresh_concurrency.max(1)),
                events,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Returns the brand's store list.
    ///
    /// An absent key is loaded before returning; a stale key is returned
    /// immediately and reloaded in the background.
    ///
    /// # Errors
    ///
    /// Returns the directory error if a cold load fails. The key is dropped
    /// again so the next call retries and failed keys do not accumulate.
    pub async fn get(
        &self,
        brand_id: &str,
        marketplace_id: &str,
    ) -> Result<Arc<[StoreRecord]>, DirectoryError> {
        let key = CacheKey::new(brand_id, marketplace_id);
        let slot = self.slot(&key);

        if let Some(snapshot) = slot.snapshot() {
            if self.is_expired(&snapshot) {
                self.schedule_refresh(key, &slot);
            }
            return Ok(snapshot.stores);
        }

        self.load_cold(&key, &slot).await
    }

    /// Current state of a key, without triggering any load.
    #[must_use]
    pub fn state(&self, brand_id: &str, marketplace_id: &str) -> EntryState {
        let key = CacheKey::new(brand_id, marketplace_id);
        let slot = {
            let slots = self
                .inner
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slots.get(&key) {
                Some(slot) => Arc::clone(slot),
                None => return EntryState::Absent,
            }
        };

        match slot.snapshot() {
            None if slot.loading.load(Ordering::Acquire) => EntryState::Loading,
            None => EntryState::Absent,
            Some(_) if slot.refreshing.load(Ordering::Acquire) => EntryState::Refreshing,
            Some(snapshot) if self.is_expired(&snapshot) => EntryState::Stale,
            Some(_) => EntryState::Fresh,
        }
    }

    /// Number of keys holding a store list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.snapshot().is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &CacheKey) -> Arc<Slot> {
        let mut slots = self
            .inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    fn is_expired(&self, snapshot: &Snapshot) -> bool {
        snapshot.loaded_at.elapsed() >= self.inner.ttl
    }

    async fn load_cold(
        &self,
        key: &CacheKey,
        slot: &Arc<Slot>,
    ) -> Result<Arc<[StoreRecord]>, DirectoryError> {
        let _evict = EvictUnloaded {
            slots: &self.inner.slots,
            key,
            slot,
        };
        let _serialized = slot.cold_load.lock().await;

        // A caller that held the lock before us may have filled the slot.
        if let Some(snapshot) = slot.snapshot() {
            return Ok(snapshot.stores);
        }

        let _loading = FlagGuard::raise(&slot.loading);

        match self
            .inner
            .directory
            .list_all_for_brand(&key.brand_id, &key.marketplace_id)
            .await
        {
            Ok(stores) => {
                let stores: Arc<[StoreRecord]> = stores.into();
                slot.replace(Arc::clone(&stores));
                tracing::info!(
                    brand_id = %key.brand_id,
                    marketplace_id = %key.marketplace_id,
                    count = stores.len(),
                    "brand store list loaded"
                );
                Ok(stores)
            }
            Err(e) => {
                tracing::warn!(
                    brand_id = %key.brand_id,
                    marketplace_id = %key.marketplace_id,
                    error = %e,
                    "brand store list load failed"
                );
                Err(e)
            }
        }
    }

    /// Starts a background reload unless one is already running for `key`.
    fn schedule_refresh(&self, key: CacheKey, slot: &Arc<Slot>) {
        if slot
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        // A refresh may have landed between the caller's read and the swap.
        if !slot.snapshot().is_some_and(|snapshot| self.is_expired(&snapshot)) {
            slot.refreshing.store(false, Ordering::Release);
            return;
        }

        tracing::debug!(%key, "scheduling brand store list refresh");

        let worker = tokio::spawn(refresh(
            Arc::clone(&self.inner),
            key.clone(),
            Arc::clone(slot),
        ));

        let inner = Arc::clone(&self.inner);
        let slot = Arc::clone(slot);
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                tracing::error!(%key, error = %e, "brand store list refresh interrupted");
                inner.events.record(StoreEvent::CacheLoadInterrupted);
            }
            slot.refreshing.store(false, Ordering::Release);
        });
    }
}

async fn refresh<D>(inner: Arc<Inner<D>>, key: CacheKey, slot: Arc<Slot>)
where
    D: StoreDirectory + 'static,
{
    let Ok(_permit) = inner.refresh_permits.acquire().await else {
        return;
    };

    match inner
        .directory
        .list_all_for_brand(&key.brand_id, &key.marketplace_id)
        .await
    {
        Ok(stores) => {
            let count = stores.len();
            slot.replace(stores.into());
            tracing::info!(%key, count, "brand store list refreshed");
        }
        Err(e) => {
            tracing::warn!(
                %key,
                error = %e,
                "brand store list refresh failed, keeping stale list"
            );
            inner.events.record(StoreEvent::CacheLoadExecutionFailure);
        }
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
