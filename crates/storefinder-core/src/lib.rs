//! Shared domain types for the store finder: the normalized store record,
//! free-text query parsing, store matching, observability events, and
//! process configuration.

pub mod app_config;
pub mod brands;
pub mod config;
pub mod error;
pub mod events;
pub mod matcher;
pub mod query;
pub mod store;

pub use app_config::{AppConfig, Environment};
pub use brands::{load_brands, BrandCatalog, BrandConfig, BrandRole};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, QueryError};
pub use events::{EventCounters, EventSink, StoreEvent};
pub use matcher::filter_stores;
pub use query::{normalize_query, NormalizedQuery};
pub use store::{DailyHours, GeoPoint, OpenWindow, StoreRecord};
