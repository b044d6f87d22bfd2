use std::sync::Arc;
use std::time::Duration;

use storefinder_core::{EventCounters, StoreEvent};

use super::*;
use crate::test_support::{store, FakeDirectory};

const BRAND: &str = "fresh";
const MARKET: &str = "ATVPDKIKX0DER";
const TTL: Duration = Duration::from_secs(8 * 60 * 60);

fn cache_with(
    directory: FakeDirectory,
) -> (BrandStoreCache<FakeDirectory>, Arc<FakeDirectory>, Arc<EventCounters>) {
    let directory = Arc::new(directory);
    let events = Arc::new(EventCounters::new());
    let cache = BrandStoreCache::new(Arc::clone(&directory), TTL, 2, events.clone());
    (cache, directory, events)
}

/// Lets spawned refresh tasks and their supervisors run to completion.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Keys held in the map, whether or not they carry a store list.
fn slot_count<D>(cache: &BrandStoreCache<D>) -> usize {
    cache.inner.slots.lock().unwrap().len()
}

fn ids(stores: &[StoreRecord]) -> Vec<&str> {
    stores.iter().map(|s| s.store_id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn cold_get_loads_and_caches() {
    let (cache, directory, _) =
        cache_with(FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")]));

    assert_eq!(cache.state(BRAND, MARKET), EntryState::Absent);
    assert!(cache.is_empty());

    let first = cache.get(BRAND, MARKET).await.unwrap();
    let second = cache.get(BRAND, MARKET).await.unwrap();

    assert_eq!(ids(&first), vec!["1"]);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(directory.list_calls(), 1);
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Fresh);
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_cold_gets_share_one_load() {
    let (cache, directory, _) = cache_with(
        FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")])
            .delayed(Duration::from_millis(200)),
    );

    let (a, b, c) = tokio::join!(
        cache.get(BRAND, MARKET),
        cache.get(BRAND, MARKET),
        cache.get(BRAND, MARKET)
    );

    assert_eq!(ids(&a.unwrap()), vec!["1"]);
    assert_eq!(ids(&b.unwrap()), vec!["1"]);
    assert_eq!(ids(&c.unwrap()), vec!["1"]);
    assert_eq!(directory.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn state_is_loading_while_first_load_runs() {
    let (cache, _, _) = cache_with(
        FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")])
            .delayed(Duration::from_millis(200)),
    );

    let loader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get(BRAND, MARKET).await.map(|s| s.len()) })
    };
    settle().await;
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Loading);

    assert_eq!(loader.await.unwrap().unwrap(), 1);
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Fresh);
}

#[tokio::test(start_paused = true)]
async fn stale_get_serves_old_value_then_refreshed_value() {
    let (cache, directory, _) =
        cache_with(FakeDirectory::with_listing(vec![store("old", "Seattle", "WA", "98101")]));

    cache.get(BRAND, MARKET).await.unwrap();
    directory.set_listing(vec![store("new", "Seattle", "WA", "98101")]);

    tokio::time::advance(TTL + Duration::from_secs(1)).await;
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Stale);

    let stale = cache.get(BRAND, MARKET).await.unwrap();
    assert_eq!(ids(&stale), vec!["old"]);
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Refreshing);

    settle().await;

    let refreshed = cache.get(BRAND, MARKET).await.unwrap();
    assert_eq!(ids(&refreshed), vec!["new"]);
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Fresh);
    assert_eq!(directory.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn only_one_refresh_runs_per_key() {
    let (cache, directory, _) = cache_with(
        FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")])
            .delayed(Duration::from_millis(100)),
    );

    cache.get(BRAND, MARKET).await.unwrap();
    tokio::time::advance(TTL).await;

    for _ in 0..5 {
        cache.get(BRAND, MARKET).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    settle().await;

    assert_eq!(directory.list_calls(), 2, "one cold load plus one refresh");
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Fresh);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_stale_reads_start_one_refresh() {
    let ttl = Duration::from_millis(50);
    let directory = Arc::new(
        FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")])
            .delayed(Duration::from_millis(300)),
    );
    let cache = BrandStoreCache::new(
        Arc::clone(&directory),
        ttl,
        4,
        Arc::new(EventCounters::new()),
    );

    cache.get(BRAND, MARKET).await.unwrap();
    tokio::time::sleep(ttl * 2).await;
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Stale);

    let start = Arc::new(tokio::sync::Barrier::new(8));
    let readers: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            let start = Arc::clone(&start);
            tokio::spawn(async move {
                start.wait().await;
                let (a, b) = tokio::join!(cache.get(BRAND, MARKET), cache.get(BRAND, MARKET));
                a.unwrap().len() + b.unwrap().len()
            })
        })
        .collect();
    for reader in readers {
        assert_eq!(reader.await.unwrap(), 2, "every stale read is served");
    }

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(directory.list_calls(), 2, "one cold load plus one refresh");
}

#[tokio::test(start_paused = true)]
async fn refresh_is_not_scheduled_for_an_entry_that_is_fresh_again() {
    let (cache, directory, _) =
        cache_with(FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")]));
    cache.get(BRAND, MARKET).await.unwrap();

    // A reader that saw the stale list before the refresh landed.
    let key = CacheKey::new(BRAND, MARKET);
    let slot = cache.slot(&key);
    cache.schedule_refresh(key, &slot);
    settle().await;

    assert!(!slot.refreshing.load(Ordering::Acquire));
    assert_eq!(directory.list_calls(), 1);
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Fresh);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_stale_value_and_retries_later() {
    let (cache, directory, events) =
        cache_with(FakeDirectory::with_listing(vec![store("old", "Seattle", "WA", "98101")]));

    cache.get(BRAND, MARKET).await.unwrap();
    directory.set_failing(true);
    tokio::time::advance(TTL).await;

    let stale = cache.get(BRAND, MARKET).await.unwrap();
    settle().await;

    assert_eq!(ids(&stale), vec!["old"]);
    assert_eq!(events.count(StoreEvent::CacheLoadExecutionFailure), 1);
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Stale);

    directory.set_failing(false);
    directory.set_listing(vec![store("new", "Seattle", "WA", "98101")]);

    let still_stale = cache.get(BRAND, MARKET).await.unwrap();
    assert_eq!(ids(&still_stale), vec!["old"]);
    settle().await;

    assert_eq!(ids(&cache.get(BRAND, MARKET).await.unwrap()), vec!["new"]);
    assert_eq!(directory.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn panicking_refresh_is_counted_as_interrupted() {
    let (cache, directory, events) =
        cache_with(FakeDirectory::with_listing(vec![store("old", "Seattle", "WA", "98101")]));

    cache.get(BRAND, MARKET).await.unwrap();
    directory.set_panicking(true);
    tokio::time::advance(TTL).await;

    cache.get(BRAND, MARKET).await.unwrap();
    settle().await;

    assert_eq!(events.count(StoreEvent::CacheLoadInterrupted), 1);
    assert_eq!(events.count(StoreEvent::CacheLoadExecutionFailure), 0);
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Stale);
    assert_eq!(ids(&cache.get(BRAND, MARKET).await.unwrap()), vec!["old"]);
}

#[tokio::test(start_paused = true)]
async fn failed_cold_load_leaves_key_absent() {
    let directory = FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")]);
    directory.set_failing(true);
    let (cache, directory, events) = cache_with(directory);

    let result = cache.get(BRAND, MARKET).await;
    assert!(matches!(result, Err(DirectoryError::ExecutionErrors { .. })));
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Absent);
    assert_eq!(cache.len(), 0);
    assert_eq!(slot_count(&cache), 0);
    assert_eq!(events.count(StoreEvent::CacheLoadExecutionFailure), 0);

    directory.set_failing(false);
    assert_eq!(cache.get(BRAND, MARKET).await.unwrap().len(), 1);
    assert_eq!(directory.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_cold_loads_do_not_accumulate_keys() {
    let directory = FakeDirectory::default();
    directory.set_failing(true);
    let (cache, directory, _) = cache_with(directory);

    for i in 0..1000 {
        assert!(cache.get(BRAND, &format!("M{i}")).await.is_err());
    }

    assert_eq!(directory.list_calls(), 1000);
    assert_eq!(slot_count(&cache), 0);
}

#[tokio::test(start_paused = true)]
async fn key_is_dropped_after_the_last_failed_waiter() {
    let directory = FakeDirectory::default().delayed(Duration::from_millis(100));
    directory.set_failing(true);
    let (cache, directory, _) = cache_with(directory);

    let (a, b, c) = tokio::join!(
        cache.get(BRAND, MARKET),
        cache.get(BRAND, MARKET),
        cache.get(BRAND, MARKET)
    );

    assert!(a.is_err() && b.is_err() && c.is_err());
    assert_eq!(directory.list_calls(), 3, "each waiter retries the load");
    assert_eq!(slot_count(&cache), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_cold_load_drops_the_key() {
    let (cache, _, _) = cache_with(
        FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")])
            .delayed(Duration::from_secs(10)),
    );

    let timed_out =
        tokio::time::timeout(Duration::from_secs(1), cache.get(BRAND, MARKET)).await;

    assert!(timed_out.is_err());
    assert_eq!(cache.state(BRAND, MARKET), EntryState::Absent);
    assert_eq!(slot_count(&cache), 0);
}

#[tokio::test(start_paused = true)]
async fn marketplaces_are_cached_separately() {
    let (cache, directory, _) =
        cache_with(FakeDirectory::with_listing(vec![store("1", "Seattle", "WA", "98101")]));

    cache.get(BRAND, MARKET).await.unwrap();
    cache.get(BRAND, "A1AM78C64UM0Y8").await.unwrap();
    cache.get(BRAND, MARKET).await.unwrap();

    assert_eq!(cache.len(), 2);
    assert_eq!(slot_count(&cache), 2);
    assert_eq!(directory.list_calls(), 2);
}

#[test]
fn cache_key_display() {
    assert_eq!(CacheKey::new("b", "m").to_string(), "b/m");
    assert_eq!(CacheKey::new("b", "m"), CacheKey::new("b", "m"));
}
