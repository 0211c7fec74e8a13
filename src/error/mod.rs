// Error types for flightcache
// Author: kelexine (https://github.com/kelexine)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Cache store connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Column not found in dataset: {0}")]
    MissingColumn(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyticsError {
    /// Failures of the cache layer itself. Queries degrade to direct
    /// computation on these; everything else is fatal to the caller.
    pub fn is_cache_failure(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Connection(_) | AnalyticsError::Serialization(_)
        )
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, AnalyticsError::Connection(_))
    }
}

// Rejected client parameters are a misconfiguration. Every other Redis
// failure (refused, timed out, dropped, unexpected reply) is a store failure
// from the caller's point of view.
impl From<redis::RedisError> for AnalyticsError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::InvalidClientConfig => AnalyticsError::Config(err.to_string()),
            _ => AnalyticsError::Connection(err.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AnalyticsError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AnalyticsError::Connection("operation timed out".to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
