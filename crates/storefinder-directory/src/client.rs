//! HTTP client for the store directory.
//!
//! Each operation POSTs a JSON body to `{base}/{operation}`, retries transport
//! failures, inspects the embedded execution errors, and maps the stores.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use storefinder_core::{BrandCatalog, BrandRole, EventSink, StoreEvent, StoreRecord};

use crate::error::DirectoryError;
use crate::location::DiscoveryLocation;
use crate::mapping::{map_stores, EnvelopeOutcome};
use crate::retry::RetryPolicy;
use crate::types::{DiscoverStoresRequest, FindStoresForBrandRequest, StoresEnvelope};
use crate::StoreDirectory;

pub const DISCOVER_IN_STORE_OPERATION: &str = "discoverGeoInStoreStores";
pub const DISCOVER_PICKUP_OPERATION: &str = "discoverGeoPickupStores";
pub const FIND_STORES_FOR_BRAND_OPERATION: &str = "findStoresForBrand";

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 300;

/// Client for the store directory.
///
/// The brand catalog decides which role `findStoresForBrand` asks for; the
/// event sink receives not-found and missing-location events.
pub struct DirectoryClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
    brands: Arc<BrandCatalog>,
    events: Arc<dyn EventSink>,
}

impl DirectoryClient {
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DirectoryError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        brands: Arc<BrandCatalog>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("storefinder/0.1")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends the operation
        // instead of replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| DirectoryError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_BASE_MS),
            brands,
            events,
        })
    }

    /// Overrides the transport retry policy.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.retry = RetryPolicy::new(max_retries, backoff_base_ms);
        self
    }

    /// Geo or postal-code discovery for the given role.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::Http`] on network failure or non-2xx status after retries.
    /// - [`DirectoryError::ExecutionErrors`] if the directory embedded errors.
    /// - [`DirectoryError::Deserialize`], [`DirectoryError::MalformedTimestamp`]
    ///   or [`DirectoryError::InvalidHours`] if the response cannot be mapped.
    pub async fn discover(
        &self,
        role: BrandRole,
        brand_id: &str,
        marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        let (operation, not_found) = match role {
            BrandRole::InStore => (DISCOVER_IN_STORE_OPERATION, StoreEvent::GeoInStoreNotFound),
            BrandRole::Pickup => (DISCOVER_PICKUP_OPERATION, StoreEvent::GeoPickupNotFound),
        };

        let request = DiscoverStoresRequest::new(brand_id, marketplace_id, location);
        let envelope = self.post_envelope(operation, &request).await?;

        match envelope.classify() {
            EnvelopeOutcome::Stores(stores) => map_stores(stores, self.events.as_ref()),
            EnvelopeOutcome::NoStores => {
                tracing::info!(
                    operation,
                    brand_id,
                    marketplace_id,
                    postal_code = location.postal_code(),
                    "no stores found"
                );
                self.events.record(not_found);
                Ok(Vec::new())
            }
            EnvelopeOutcome::ExecutionErrors(errors) => {
                tracing::error!(operation, ?errors, "directory reported execution errors");
                Err(DirectoryError::ExecutionErrors { operation, errors })
            }
        }
    }

    /// Full store list for a brand, in the brand's configured role.
    ///
    /// # Errors
    ///
    /// Same as [`DirectoryClient::discover`].
    pub async fn find_stores_for_brand(
        &self,
        brand_id: &str,
        marketplace_id: &str,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        let operation = FIND_STORES_FOR_BRAND_OPERATION;
        let role = self.brands.role_for(brand_id);
        let request = FindStoresForBrandRequest::new(brand_id, marketplace_id, role);
        let envelope = self.post_envelope(operation, &request).await?;

        match envelope.classify() {
            EnvelopeOutcome::Stores(stores) => {
                let records = map_stores(stores, self.events.as_ref())?;
                tracing::debug!(
                    brand_id,
                    marketplace_id,
                    %role,
                    count = records.len(),
                    "listed brand stores"
                );
                Ok(records)
            }
            EnvelopeOutcome::NoStores => Ok(Vec::new()),
            EnvelopeOutcome::ExecutionErrors(errors) => {
                tracing::error!(operation, ?errors, "directory reported execution errors");
                Err(DirectoryError::ExecutionErrors { operation, errors })
            }
        }
    }

    /// POSTs `body`, retrying transport failures, and parses the envelope.
    async fn post_envelope<B>(
        &self,
        operation: &'static str,
        body: &B,
    ) -> Result<StoresEnvelope, DirectoryError>
    where
        B: Serialize + Sync,
    {
        let url = self
            .base_url
            .join(operation)
            .map_err(|e| DirectoryError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let client = &self.client;
        let url = &url;
        let text = self
            .retry
            .run(operation, move || async move {
                let response = client.post(url.clone()).json(body).send().await?;
                let response = response.error_for_status()?;
                Ok::<_, DirectoryError>(response.text().await?)
            })
            .await?;

        tracing::debug!(operation, bytes = text.len(), "directory response received");

        serde_json::from_str(&text).map_err(|e| DirectoryError::Deserialize {
            context: operation.to_string(),
            source: e,
        })
    }
}

impl StoreDirectory for DirectoryClient {
    async fn discover_by_geo_in_store(
        &self,
        brand_id: &str,
        marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.discover(BrandRole::InStore, brand_id, marketplace_id, location)
            .await
    }

    async fn discover_by_geo_pickup(
        &self,
        brand_id: &str,
        marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.discover(BrandRole::Pickup, brand_id, marketplace_id, location)
            .await
    }

    async fn list_all_for_brand(
        &self,
        brand_id: &str,
        marketplace_id: &str,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.find_stores_for_brand(brand_id, marketplace_id).await
    }
}
