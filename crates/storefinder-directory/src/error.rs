use thiserror::Error;

/// Errors returned by the store-directory client.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Network or TLS failure, or a non-2xx status after retries.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The directory answered but reported failures of its own dependencies.
    #[error("directory reported execution errors for {operation}: {}", errors.join("; "))]
    ExecutionErrors {
        operation: &'static str,
        errors: Vec<String>,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed timestamp '{value}' for store {store_id}: {source}")]
    MalformedTimestamp {
        store_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("store {store_id} has an opening window that does not end after it starts")]
    InvalidHours { store_id: String },

    #[error("invalid directory base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
