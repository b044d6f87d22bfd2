use std::sync::Arc;
use std::time::Duration;

use storefinder_core::{BrandConfig, EventCounters, QueryError};

use super::*;
use crate::test_support::{store, FakeDirectory};

const FRESH: &str = "fresh";
const GROCER: &str = "grocer";
const MARKET: &str = "ATVPDKIKX0DER";
const UNSERVED_MARKET: &str = "A1AM78C64UM0Y8";

fn catalog() -> Arc<BrandCatalog> {
    let brand = |id: &str, role| BrandConfig {
        id: id.to_string(),
        name: id.to_uppercase(),
        role,
        prewarm: false,
    };
    Arc::new(BrandCatalog {
        brands: vec![brand(FRESH, BrandRole::InStore), brand(GROCER, BrandRole::Pickup)],
    })
}

fn finder(directory: FakeDirectory) -> (StoreFinder<FakeDirectory>, Arc<FakeDirectory>) {
    let directory = Arc::new(directory);
    let cache = BrandStoreCache::new(
        Arc::clone(&directory),
        Duration::from_secs(3600),
        1,
        Arc::new(EventCounters::new()),
    );
    (
        StoreFinder::new(
            Arc::clone(&directory),
            cache,
            catalog(),
            [MARKET.to_string()],
        ),
        directory,
    )
}

fn brand_listing() -> Vec<StoreRecord> {
    vec![
        store("slc", "Salt Lake City", "UT", "84101"),
        store("sea", "Seattle", "WA", "98101"),
        store("pdx", "Portland", "OR", "97201"),
        store("tac", "Tacoma", "WA", "98402"),
    ]
}

fn ids(stores: &[StoreRecord]) -> Vec<&str> {
    stores.iter().map(|s| s.store_id.as_str()).collect()
}

#[tokio::test]
async fn nearby_uses_brand_role() {
    let (finder, directory) = finder(FakeDirectory::default());
    directory.set_discovered(vec![store("sea", "Seattle", "WA", "98101")]);

    let geo = GeoContext {
        ip_address: Some("203.0.113.9".to_string()),
        ..GeoContext::default()
    };
    let in_store = finder.lookup_nearby(FRESH, MARKET, geo.clone()).await.unwrap();
    let pickup = finder.lookup_nearby(GROCER, MARKET, geo.clone()).await.unwrap();

    assert_eq!(ids(&in_store), vec!["sea"]);
    assert_eq!(ids(&pickup), vec!["sea"]);
    assert_eq!(
        directory.discoveries(),
        vec![
            (BrandRole::InStore, DiscoveryLocation::Geo(geo.clone())),
            (BrandRole::Pickup, DiscoveryLocation::Geo(geo)),
        ]
    );
    assert_eq!(directory.list_calls(), 0, "nearby never touches the cache");
}

#[tokio::test]
async fn unknown_brand_is_rejected_before_any_call() {
    let (finder, directory) = finder(FakeDirectory::with_listing(brand_listing()));

    let nearby = finder
        .lookup_nearby("nope", MARKET, GeoContext::default())
        .await;
    let search = finder.search("nope", MARKET, "seattle").await;

    assert!(matches!(nearby, Err(LookupError::InvalidBrand(ref b)) if b == "nope"));
    assert!(matches!(search, Err(LookupError::InvalidBrand(_))));
    assert!(directory.discoveries().is_empty());
    assert_eq!(directory.list_calls(), 0);
}

#[tokio::test]
async fn unknown_marketplace_is_rejected_before_any_call() {
    let (finder, directory) = finder(FakeDirectory::with_listing(brand_listing()));

    let nearby = finder
        .lookup_nearby(FRESH, UNSERVED_MARKET, GeoContext::default())
        .await;
    let search = finder.search(GROCER, UNSERVED_MARKET, "seattle").await;

    assert!(matches!(nearby, Err(LookupError::InvalidMarketplace(ref m)) if m == UNSERVED_MARKET));
    assert!(matches!(search, Err(LookupError::InvalidMarketplace(_))));
    assert!(directory.discoveries().is_empty());
    assert_eq!(directory.list_calls(), 0);
    assert_eq!(
        finder.cache().state(GROCER, UNSERVED_MARKET),
        crate::EntryState::Absent
    );
}

#[tokio::test]
async fn exact_postal_code_goes_to_directory() {
    let (finder, directory) = finder(FakeDirectory::with_listing(brand_listing()));
    directory.set_discovered(vec![
        store("sea", "Seattle", "WA", "98101"),
        store("bel", "Bellevue", "WA", "98004"),
    ]);

    let all = finder.search(GROCER, MARKET, "98101").await.unwrap();
    assert_eq!(ids(&all), vec!["sea", "bel"], "postal code is not re-applied");

    let narrowed = finder.search(FRESH, MARKET, "bell, 98101").await.unwrap();
    assert_eq!(ids(&narrowed), vec!["bel"]);

    assert_eq!(
        directory.discoveries(),
        vec![
            (
                BrandRole::Pickup,
                DiscoveryLocation::PostalCode("98101".to_string())
            ),
            (
                BrandRole::InStore,
                DiscoveryLocation::PostalCode("98101".to_string())
            ),
        ]
    );
    assert_eq!(directory.list_calls(), 0);
}

#[tokio::test]
async fn place_words_search_the_cached_listing() {
    let (finder, directory) = finder(FakeDirectory::with_listing(brand_listing()));

    let slc = finder.search(GROCER, MARKET, "lake ut").await.unwrap();
    assert_eq!(ids(&slc), vec!["slc"]);

    let wa = finder.search(GROCER, MARKET, "wa").await.unwrap();
    assert_eq!(ids(&wa), vec!["sea", "tac"]);

    assert_eq!(directory.list_calls(), 1, "listing loaded once then cached");
    assert!(directory.discoveries().is_empty());
}

#[tokio::test]
async fn partial_postal_code_filters_cached_listing_by_prefix() {
    let (finder, directory) = finder(FakeDirectory::with_listing(brand_listing()));

    let found = finder.search(GROCER, MARKET, "981").await.unwrap();
    assert_eq!(ids(&found), vec!["sea"]);

    let with_words = finder.search(GROCER, MARKET, "tacoma 98").await.unwrap();
    assert_eq!(ids(&with_words), vec!["tac"]);

    assert!(directory.discoveries().is_empty());
}

#[tokio::test]
async fn malformed_query_is_invalid_without_calls() {
    let (finder, directory) = finder(FakeDirectory::with_listing(brand_listing()));

    for raw in ["a", "abc123", "98101 12345", ",,,,", "seattle!"] {
        let result = finder.search(GROCER, MARKET, raw).await;
        assert!(
            matches!(result, Err(LookupError::InvalidQuery(_))),
            "{raw:?} should be rejected, got {result:?}"
        );
    }
    assert!(matches!(
        finder.search(GROCER, MARKET, "98101 12345").await,
        Err(LookupError::InvalidQuery(QueryError::PostalCodeAlreadySet(_)))
    ));
    assert_eq!(directory.list_calls(), 0);
    assert!(directory.discoveries().is_empty());
}

#[tokio::test]
async fn directory_failures_surface_as_dependency_errors() {
    let (finder, directory) = finder(FakeDirectory::with_listing(brand_listing()));
    directory.set_failing(true);

    let nearby = finder
        .lookup_nearby(FRESH, MARKET, GeoContext::default())
        .await;
    let postal = finder.search(FRESH, MARKET, "98101").await;
    let cached = finder.search(FRESH, MARKET, "seattle").await;

    assert!(matches!(nearby, Err(LookupError::Dependency(_))));
    assert!(matches!(postal, Err(LookupError::Dependency(_))));
    assert!(matches!(cached, Err(LookupError::Dependency(_))));
}
