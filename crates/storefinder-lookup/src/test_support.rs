//! In-memory [`StoreDirectory`] used by this crate's unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use storefinder_core::{BrandRole, StoreRecord};
use storefinder_directory::{DirectoryError, DiscoveryLocation, StoreDirectory};

pub(crate) fn store(id: &str, city: &str, state: &str, postal: &str) -> StoreRecord {
    StoreRecord {
        city: Some(city.to_string()),
        state: Some(state.to_string()),
        postal_code: Some(postal.to_string()),
        ..StoreRecord::new(id, format!("{city} {id}"))
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    listing: Mutex<Vec<StoreRecord>>,
    discovered: Mutex<Vec<StoreRecord>>,
    discoveries: Mutex<Vec<(BrandRole, DiscoveryLocation)>>,
    list_calls: AtomicUsize,
    fail: AtomicBool,
    panic: AtomicBool,
    delay: Duration,
}

impl FakeDirectory {
    pub(crate) fn with_listing(stores: Vec<StoreRecord>) -> Self {
        Self {
            listing: Mutex::new(stores),
            ..Self::default()
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn set_listing(&self, stores: Vec<StoreRecord>) {
        *self.listing.lock().unwrap() = stores;
    }

    pub(crate) fn set_discovered(&self, stores: Vec<StoreRecord>) {
        *self.discovered.lock().unwrap() = stores;
    }

    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_panicking(&self, panic: bool) {
        self.panic.store(panic, Ordering::SeqCst);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn discoveries(&self) -> Vec<(BrandRole, DiscoveryLocation)> {
        self.discoveries.lock().unwrap().clone()
    }

    fn failure(operation: &'static str) -> DirectoryError {
        DirectoryError::ExecutionErrors {
            operation,
            errors: vec!["downstream unavailable".to_string()],
        }
    }

    async fn discover(
        &self,
        role: BrandRole,
        location: &DiscoveryLocation,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.discoveries
            .lock()
            .unwrap()
            .push((role, location.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Self::failure("discover"));
        }
        Ok(self.discovered.lock().unwrap().clone())
    }
}

impl StoreDirectory for FakeDirectory {
    async fn discover_by_geo_in_store(
        &self,
        _brand_id: &str,
        _marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.discover(BrandRole::InStore, location).await
    }

    async fn discover_by_geo_pickup(
        &self,
        _brand_id: &str,
        _marketplace_id: &str,
        location: &DiscoveryLocation,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.discover(BrandRole::Pickup, location).await
    }

    async fn list_all_for_brand(
        &self,
        _brand_id: &str,
        _marketplace_id: &str,
    ) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        assert!(
            !self.panic.load(Ordering::SeqCst),
            "directory fake told to panic"
        );
        if self.fail.load(Ordering::SeqCst) {
            return Err(Self::failure("findStoresForBrand"));
        }
        Ok(self.listing.lock().unwrap().clone())
    }
}
