//! The two store lookups exposed to callers.

use std::collections::HashSet;
use std::sync::Arc;

use storefinder_core::{filter_stores, normalize_query, BrandCatalog, BrandRole, StoreRecord};
use storefinder_directory::{DirectoryError, DiscoveryLocation, GeoContext, StoreDirectory};

use crate::cache::BrandStoreCache;
use crate::error::LookupError;

/// Routes nearby and search requests to the directory or the brand cache.
pub struct StoreFinder<D> {
    directory: Arc<D>,
    cache: BrandStoreCache<D>,
    brands: Arc<BrandCatalog>,
    marketplaces: HashSet<String>,
}

impl<D> StoreFinder<D>
where
    D: StoreDirectory + 'static,
{
    /// Only brands in `brands` and marketplaces in `marketplaces` are
    /// served; anything else is rejected before reaching the directory or
    /// the cache.
    #[must_use]
    pub fn new(
        directory: Arc<D>,
        cache: BrandStoreCache<D>,
        brands: Arc<BrandCatalog>,
        marketplaces: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            directory,
            cache,
            brands,
            marketplaces: marketplaces.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &BrandStoreCache<D> {
        &self.cache
    }

    /// Stores near the customer, as geolocated by the directory.
    ///
    /// Always a live directory call: results depend on the customer.
    ///
    /// # Errors
    ///
    /// [`LookupError::InvalidBrand`] or [`LookupError::InvalidMarketplace`]
    /// for an unconfigured id, or [`LookupError::Dependency`] if the
    /// directory call fails.
    pub async fn lookup_nearby(
        &self,
        brand_id: &str,
        marketplace_id: &str,
        geo: GeoContext,
    ) -> Result<Vec<StoreRecord>, LookupError> {
        let role = self.validate_brand(brand_id)?;
        self.validate_marketplace(marketplace_id)?;
        let stores = self
            .discover(role, brand_id, marketplace_id, &DiscoveryLocation::Geo(geo))
            .await?;
        Ok(stores)
    }

    /// Free-text store search.
    ///
    /// A query holding an exact five-digit postal code goes straight to the
    /// directory with that postal code and is then narrowed by its place
    /// words only. Anything else is matched against the brand's cached store
    /// list, postal prefix included.
    ///
    /// # Errors
    ///
    /// [`LookupError::InvalidBrand`], [`LookupError::InvalidMarketplace`],
    /// [`LookupError::InvalidQuery`] for a
    /// malformed query, or [`LookupError::Dependency`] if the directory call
    /// or a cold cache load fails.
    pub async fn search(
        &self,
        brand_id: &str,
        marketplace_id: &str,
        raw_query: &str,
    ) -> Result<Vec<StoreRecord>, LookupError> {
        let role = self.validate_brand(brand_id)?;
        self.validate_marketplace(marketplace_id)?;
        let query = normalize_query(raw_query)?;

        if let Some(postal_code) = query.exact_postal_code() {
            let location = DiscoveryLocation::PostalCode(postal_code.to_string());
            let stores = self
                .discover(role, brand_id, marketplace_id, &location)
                .await?;
            return Ok(filter_stores(&stores, None, query.place_words()));
        }

        let stores = self.cache.get(brand_id, marketplace_id).await?;
        let matched = filter_stores(&stores, query.postal_code(), query.place_words());
        tracing::debug!(
            brand_id,
            marketplace_id,
            place = %query.place_text(),
            candidates = stores.len(),
            matched = matched.len(),
            "searched cached brand stores"
        );
        Ok(matched)
    }

    fn validate_brand(&self, brand_id: &str) -> Result<BrandRole, LookupError> {
        match self.brands.get(brand_id) {
            Some(brand) => Ok(brand.role),
            None => {
                tracing::error!(brand_id, "request for unconfigured brand");
                Err(LookupError::InvalidBrand(brand_id.to_string()))
            }
        }
    }

    fn validate_marketplace(&self, marketplace_id: &str) -> Result<(), LookupError> {
        if self.marketplaces.contains(marketplace_id) {
            return Ok(());
        }
        tracing::warn!(marketplace_id, "request for unconfigured marketplace");
        Err(LookupError::InvalidMarketplace(marketplace_id.to_string()))
    }

    async fn discover(
        &self,
        role: BrandRole,
        brand_id: &str,
        marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        match role {
            BrandRole::InStore => {
                self.directory
                    .discover_by_geo_in_store(brand_id, marketplace_id, location)
                    .await
            }
            BrandRole::Pickup => {
                self.directory
                    .discover_by_geo_pickup(brand_id, marketplace_id, location)
                    .await
            }
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
