//! Startup pre-warm of the brand store cache.
//!
//! Unlike steady-state refreshes, pre-warm is fail-fast: the first load that
//! errors, panics, or misses its deadline aborts startup and cancels the rest.

use std::time::Duration;

use storefinder_core::{EventSink, StoreEvent};
use storefinder_directory::StoreDirectory;
use tokio::task::JoinSet;

use crate::cache::{BrandStoreCache, CacheKey};
use crate::error::StartupError;

/// Loads every key into `cache` concurrently, each bounded by `timeout`.
///
/// Returns the number of keys loaded.
///
/// # Errors
///
/// Returns the first [`StartupError`] encountered. Loads still running at
/// that point are aborted.
pub async fn prewarm<D>(
    cache: &BrandStoreCache<D>,
    keys: impl IntoIterator<Item = CacheKey>,
    timeout: Duration,
    events: &dyn EventSink,
) -> Result<usize, StartupError>
where
    D: StoreDirectory + 'static,
{
    let mut tasks = JoinSet::new();
    for key in keys {
        let cache = cache.clone();
        tasks.spawn(async move {
            let outcome =
                tokio::time::timeout(timeout, cache.get(&key.brand_id, &key.marketplace_id)).await;
            (key, outcome)
        });
    }

    let total = tasks.len();
    tracing::info!(keys = total, ?timeout, "pre-warming brand store cache");

    let mut warmed = 0;
    while let Some(joined) = tasks.join_next().await {
        let (key, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(error = %e, "pre-warm task interrupted");
                events.record(StoreEvent::CacheLoadInterrupted);
                return Err(StartupError::Interrupted(e.to_string()));
            }
        };

        match outcome {
            Ok(Ok(stores)) => {
                warmed += 1;
                tracing::info!(%key, count = stores.len(), "pre-warmed brand store list");
            }
            Ok(Err(source)) => {
                tracing::error!(%key, error = %source, "pre-warm load failed");
                events.record(StoreEvent::CacheLoadExecutionFailure);
                return Err(StartupError::Load {
                    brand_id: key.brand_id,
                    marketplace_id: key.marketplace_id,
                    source,
                });
            }
            Err(_) => {
                tracing::error!(%key, ?timeout, "pre-warm load timed out");
                events.record(StoreEvent::CacheLoadTimeout);
                return Err(StartupError::Timeout {
                    brand_id: key.brand_id,
                    marketplace_id: key.marketplace_id,
                    timeout,
                });
            }
        }
    }

    Ok(warmed)
}
