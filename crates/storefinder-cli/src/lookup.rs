//! Command handlers for `search`, `nearby`, and `brands`.
//!
//! The CLI builds the same directory client and cache the server uses but
//! skips pre-warm: each invocation answers one query and exits.

use std::sync::Arc;

use storefinder_core::{AppConfig, BrandCatalog, EventCounters, StoreRecord};
use storefinder_directory::{DirectoryClient, GeoContext};
use storefinder_lookup::{BrandStoreCache, StoreFinder};

fn build_finder(config: &AppConfig) -> anyhow::Result<StoreFinder<DirectoryClient>> {
    let brands = Arc::new(storefinder_core::load_brands(&config.brands_path)?);
    let events = Arc::new(EventCounters::new());
    let directory = Arc::new(
        DirectoryClient::new(
            &config.directory_url,
            config.directory_timeout_secs,
            Arc::clone(&brands),
            events.clone(),
        )?
        .with_retry(config.directory_max_retries, config.directory_backoff_base_ms),
    );
    let cache = BrandStoreCache::new(
        Arc::clone(&directory),
        config.cache_ttl(),
        config.cache_refresh_concurrency,
        events,
    );
    Ok(StoreFinder::new(
        directory,
        cache,
        brands,
        config.marketplace_ids.iter().cloned(),
    ))
}

/// # Errors
///
/// Returns an error if the brands file cannot be loaded, the query is
/// rejected, or the store directory call fails.
pub(crate) async fn run_search(
    config: &AppConfig,
    brand: &str,
    marketplace: &str,
    query: &str,
    json: bool,
) -> anyhow::Result<()> {
    let finder = build_finder(config)?;
    let stores = finder.search(brand, marketplace, query).await?;
    tracing::debug!(brand, query, count = stores.len(), "search complete");
    print_stores(&stores, json)
}

/// # Errors
///
/// Returns an error if the brands file cannot be loaded or the store
/// directory call fails.
pub(crate) async fn run_nearby(
    config: &AppConfig,
    brand: &str,
    marketplace: &str,
    geo: GeoContext,
    json: bool,
) -> anyhow::Result<()> {
    let finder = build_finder(config)?;
    let stores = finder.lookup_nearby(brand, marketplace, geo).await?;
    print_stores(&stores, json)
}

pub(crate) fn run_brands(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let catalog = storefinder_core::load_brands(&config.brands_path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.brands)?);
        return Ok(());
    }
    print!("{}", brands_table(&catalog));
    Ok(())
}

fn print_stores(stores: &[StoreRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stores)?);
    } else if stores.is_empty() {
        println!("no stores found");
    } else {
        print!("{}", stores_table(stores));
    }
    Ok(())
}

fn stores_table(stores: &[StoreRecord]) -> String {
    let mut out = format!(
        "{:<16}{:<32}{:<22}{:<7}{:<12}MILES\n",
        "STORE", "NAME", "CITY", "STATE", "POSTAL"
    );
    for store in stores {
        let miles = store
            .distance_in_miles
            .map_or_else(|| "\u{2014}".to_string(), |d| format!("{d:.1}"));
        out.push_str(&format!(
            "{:<16}{:<32}{:<22}{:<7}{:<12}{}\n",
            store.store_id,
            truncate(&store.name, 30),
            truncate(store.city.as_deref().unwrap_or_default(), 20),
            store.state.as_deref().unwrap_or_default(),
            store.postal_code.as_deref().unwrap_or_default(),
            miles,
        ));
    }
    out
}

fn brands_table(catalog: &BrandCatalog) -> String {
    let mut out = format!("{:<28}{:<24}{:<9}PREWARM\n", "ID", "NAME", "ROLE");
    for brand in &catalog.brands {
        out.push_str(&format!(
            "{:<28}{:<24}{:<9}{}\n",
            brand.id,
            truncate(&brand.name, 22),
            brand.role,
            if brand.prewarm { "yes" } else { "no" },
        ));
    }
    out
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        format!("{}...", value.chars().take(max - 3).collect::<String>())
    } else {
        value.to_string()
    }
}
