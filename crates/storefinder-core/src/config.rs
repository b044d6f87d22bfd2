use std::env::VarError;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Reads `.env` (if present) and then the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if `STOREFINDER_DIRECTORY_URL` is unset or any
/// variable fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Same as [`load_app_config`] without touching `.env`.
///
/// # Errors
///
/// See [`load_app_config`].
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let env = Env(lookup);

    let directory_url = env.required("STOREFINDER_DIRECTORY_URL")?;
    let cache_refresh_concurrency: usize =
        env.parse("STOREFINDER_CACHE_REFRESH_CONCURRENCY", "4")?;
    if cache_refresh_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOREFINDER_CACHE_REFRESH_CONCURRENCY".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let default_marketplace_id = env.or("STOREFINDER_DEFAULT_MARKETPLACE_ID", "ATVPDKIKX0DER");
    let marketplace_ids = marketplace_list(
        &env.or("STOREFINDER_MARKETPLACE_IDS", ""),
        &default_marketplace_id,
    );

    Ok(AppConfig {
        env: parse_environment(&env.or("STOREFINDER_ENV", "development")),
        bind_addr: env.parse("STOREFINDER_BIND_ADDR", "0.0.0.0:3000")?,
        log_level: env.or("STOREFINDER_LOG_LEVEL", "info"),
        brands_path: PathBuf::from(env.or("STOREFINDER_BRANDS_PATH", "./config/brands.yaml")),
        default_marketplace_id,
        marketplace_ids,
        directory_url,
        directory_timeout_secs: env.parse("STOREFINDER_DIRECTORY_TIMEOUT_SECS", "10")?,
        directory_max_retries: env.parse("STOREFINDER_DIRECTORY_MAX_RETRIES", "2")?,
        directory_backoff_base_ms: env.parse("STOREFINDER_DIRECTORY_BACKOFF_BASE_MS", "300")?,
        // 8 hours
        cache_ttl_secs: env.parse("STOREFINDER_CACHE_TTL_SECS", "28800")?,
        cache_refresh_concurrency,
        prewarm_timeout_ms: env.parse("STOREFINDER_PREWARM_TIMEOUT_MS", "3000")?,
    })
}

/// Variable lookup with defaults and typed parsing.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    fn required(&self, var: &str) -> Result<String, ConfigError> {
        (self.0)(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    }

    fn or(&self, var: &str, default: &str) -> String {
        (self.0)(var).unwrap_or_else(|_| default.to_string())
    }

    fn parse<T>(&self, var: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.or(var, default)
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Comma-separated marketplace ids, deduplicated. The default marketplace is
/// always served.
fn marketplace_list(raw: &str, default_marketplace_id: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in std::iter::once(default_marketplace_id).chain(raw.split(',')) {
        let id = id.trim();
        if !id.is_empty() && !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

/// Anything other than `production` or `test` is development.
fn parse_environment(s: &str) -> Environment {
    match s.trim().to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
