//! Store lookup: the refresh-ahead brand store cache, its startup pre-warm,
//! and the [`StoreFinder`] service that routes nearby and search requests.

pub mod cache;
pub mod error;
pub mod prewarm;
pub mod service;

pub use cache::{BrandStoreCache, CacheKey, EntryState};
pub use error::{LookupError, StartupError};
pub use prewarm::prewarm;
pub use service::StoreFinder;

#[cfg(test)]
mod test_support;
