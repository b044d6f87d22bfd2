use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub default_marketplace_id: String,
    /// Marketplaces requests may name; always includes the default.
    pub marketplace_ids: Vec<String>,
    pub directory_url: String,
    pub directory_timeout_secs: u64,
    pub directory_max_retries: u32,
    pub directory_backoff_base_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_refresh_concurrency: usize,
    pub prewarm_timeout_ms: u64,
}

impl AppConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn prewarm_timeout(&self) -> Duration {
        Duration::from_millis(self.prewarm_timeout_ms)
    }
}
