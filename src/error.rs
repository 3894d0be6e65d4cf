//! Error types for static-cache

use thiserror::Error;

/// Result type alias for static-cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

/// Errors raised by cache clearing and the tracking table
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("The cache path is not defined")]
    NotConfigured,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Shell clear failed: {0}")]
    Shell(String),

    #[error("Tracking table error: {0}")]
    Tracking(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Tracking(err.to_string())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Site resolution errors
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("No site matches request host '{0}'")]
    NoMatch(String),

    #[error("Invalid site base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<url::ParseError> for SiteError {
    fn from(err: url::ParseError) -> Self {
        SiteError::InvalidBaseUrl(err.to_string())
    }
}
