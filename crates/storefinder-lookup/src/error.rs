use std::time::Duration;

use storefinder_core::QueryError;
use storefinder_directory::DirectoryError;
use thiserror::Error;

/// Errors surfaced by [`crate::StoreFinder`] operations.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The free-text query was rejected; the caller's fault.
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),

    #[error("unknown brand id: {0}")]
    InvalidBrand(String),

    #[error("unknown marketplace id: {0}")]
    InvalidMarketplace(String),

    #[error("store directory failure: {0}")]
    Dependency(#[from] DirectoryError),
}

/// Failures that abort process startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("pre-warm of {brand_id}/{marketplace_id} did not finish within {timeout:?}")]
    Timeout {
        brand_id: String,
        marketplace_id: String,
        timeout: Duration,
    },

    #[error("pre-warm of {brand_id}/{marketplace_id} failed: {source}")]
    Load {
        brand_id: String,
        marketplace_id: String,
        #[source]
        source: DirectoryError,
    },

    #[error("pre-warm task was interrupted: {0}")]
    Interrupted(String),
}
