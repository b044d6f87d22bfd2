//! Named observability events.
//!
//! The lookup core only counts occurrences; where the counts go is up to the
//! [`EventSink`] the host process installs.

use std::sync::atomic::{AtomicU64, Ordering};

const EVENT_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    /// In-store discovery succeeded but returned no stores.
    GeoInStoreNotFound,
    /// Pickup discovery succeeded but returned no stores.
    GeoPickupNotFound,
    /// A store record arrived without its location block.
    StoreLocationMissing,
    /// A cache load or refresh failed.
    CacheLoadExecutionFailure,
    /// A cache load task panicked or was cancelled.
    CacheLoadInterrupted,
    /// A startup pre-warm load exceeded its deadline.
    CacheLoadTimeout,
}

impl StoreEvent {
    pub const ALL: [StoreEvent; EVENT_COUNT] = [
        StoreEvent::GeoInStoreNotFound,
        StoreEvent::GeoPickupNotFound,
        StoreEvent::StoreLocationMissing,
        StoreEvent::CacheLoadExecutionFailure,
        StoreEvent::CacheLoadInterrupted,
        StoreEvent::CacheLoadTimeout,
    ];

    #[must_use]
    pub fn metric_name(self) -> &'static str {
        match self {
            StoreEvent::GeoInStoreNotFound => "DiscoverGeoInStoreStores.NotFound",
            StoreEvent::GeoPickupNotFound => "DiscoverGeoPickupStores.NotFound",
            StoreEvent::StoreLocationMissing => "StoreLocation.NotFound",
            StoreEvent::CacheLoadExecutionFailure => "CacheLoad.ExecutionFailure",
            StoreEvent::CacheLoadInterrupted => "CacheLoad.Interrupted",
            StoreEvent::CacheLoadTimeout => "CacheLoad.Timeout",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.metric_name())
    }
}

/// Receives observability events. Must be cheap and non-blocking; it is
/// called on request paths and from background refresh tasks.
pub trait EventSink: Send + Sync {
    fn record(&self, event: StoreEvent);
}

/// In-process counters, one per [`StoreEvent`].
#[derive(Debug, Default)]
pub struct EventCounters {
    counts: [AtomicU64; EVENT_COUNT],
}

impl EventCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self, event: StoreEvent) -> u64 {
        self.counts[event.index()].load(Ordering::Relaxed)
    }

    /// Current value of every counter, keyed by metric name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        StoreEvent::ALL
            .iter()
            .map(|e| (e.metric_name(), self.count(*e)))
            .collect()
    }
}

impl EventSink for EventCounters {
    fn record(&self, event: StoreEvent) {
        let total = self.counts[event.index()].fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(metric = event.metric_name(), total, "event recorded");
    }
}
