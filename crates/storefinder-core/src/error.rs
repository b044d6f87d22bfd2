use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("brands validation error: {0}")]
    Validation(String),
}

/// Reasons a raw free-text search query is rejected.
///
/// Every variant carries the raw query so the caller can log or echo it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid search query \"{0}\": only letters, digits, commas and spaces are allowed")]
    InvalidCharacters(String),

    #[error("invalid search query \"{0}\": must be at least 2 characters")]
    TooShort(String),

    #[error(
        "invalid search query \"{query}\": word \"{token}\" must be either all letters or all digits"
    )]
    MixedToken { query: String, token: String },

    #[error("invalid search query \"{0}\": postal code has already been set")]
    PostalCodeAlreadySet(String),

    #[error("invalid search query \"{0}\": no alphabetic or numeric words found")]
    Empty(String),
}
