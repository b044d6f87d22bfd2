//! Client for the downstream store directory.
//!
//! Three operations are exposed through [`StoreDirectory`]: geo discovery of
//! in-store stores, geo discovery of pickup stores, and the full store list
//! for a brand. Responses are mapped into [`StoreRecord`]s; execution errors
//! the directory embeds inside an otherwise successful response surface as
//! [`DirectoryError::ExecutionErrors`].

use std::future::Future;

use storefinder_core::StoreRecord;

pub mod client;
pub mod error;
pub mod location;
pub(crate) mod mapping;
pub(crate) mod retry;
pub mod types;

pub use client::DirectoryClient;
pub use error::DirectoryError;
pub use location::{DiscoveryLocation, GeoContext};

/// The store-directory operations the lookup layer depends on.
pub trait StoreDirectory: Send + Sync {
    /// Stores the customer can shop inside, within the discovery radius of
    /// `location`. An empty list means the directory found nothing.
    fn discover_by_geo_in_store(
        &self,
        brand_id: &str,
        marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> impl Future<Output = Result<Vec<StoreRecord>, DirectoryError>> + Send;

    /// Pickup locations within the discovery radius of `location`.
    fn discover_by_geo_pickup(
        &self,
        brand_id: &str,
        marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> impl Future<Output = Result<Vec<StoreRecord>, DirectoryError>> + Send;

    /// Every store the brand operates in the marketplace.
    fn list_all_for_brand(
        &self,
        brand_id: &str,
        marketplace_id: &str,
    ) -> impl Future<Output = Result<Vec<StoreRecord>, DirectoryError>> + Send;
}
