mod api;
mod middleware;

use std::sync::Arc;

use storefinder_core::EventCounters;
use storefinder_directory::DirectoryClient;
use storefinder_lookup::{prewarm, BrandStoreCache, CacheKey, StoreFinder};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = storefinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

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
        events.clone(),
    );

    // A brand that cannot be loaded at startup keeps the process from serving.
    let keys: Vec<CacheKey> = brands
        .prewarm_brand_ids()
        .map(|brand_id| CacheKey::new(brand_id, &config.default_marketplace_id))
        .collect();
    let warmed = prewarm(&cache, keys, config.prewarm_timeout(), events.as_ref()).await?;

    let state = AppState {
        finder: Arc::new(StoreFinder::new(
            directory,
            cache,
            brands,
            config.marketplace_ids.iter().cloned(),
        )),
        events,
        default_marketplace_id: Arc::from(config.default_marketplace_id.as_str()),
    };
    let app = build_app(state);

    tracing::info!(
        bind_addr = %config.bind_addr,
        env = ?config.env,
        warmed,
        "storefinder server listening"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
