//! Configuration data structures for flightcache.
//!
//! This module defines the schema for the application settings: the Redis
//! connection, cache behavior, dataset location and column names, and
//! logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};

/// Longest accepted cache TTL: one year.
pub const MAX_TTL_SECONDS: u64 = 60 * 60 * 24 * 365;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Redis connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Cache behavior (TTL, key namespace).
    #[serde(default)]
    pub cache: CacheSettings,

    /// Source dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the external key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Hostname or IP address of the Redis server.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// Redis port.
    /// Default: `6379`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logical database index.
    /// Default: `0`
    #[serde(default)]
    pub db: i64,

    /// Optional password (AUTH). Never logged in clear text.
    #[serde(default)]
    pub password: Option<String>,

    /// Upper bound for establishing the connection, in milliseconds.
    /// Default: `2000`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Upper bound for a single command round trip, in milliseconds.
    /// Default: `1000`
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,

    /// Extra connection attempts after the first one fails.
    /// Default: `2`
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

/// Settings for cached query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Expiry applied to every stored result, in seconds. Must be between
    /// 1 and `MAX_TTL_SECONDS`.
    /// Default: `60`
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Namespace prepended to every key; `clear_all` only touches this namespace.
    /// Default: `flightcache`
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Settings for the flight dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the CSV file.
    /// Default: `flights.csv`
    #[serde(default = "default_dataset_path")]
    pub path: String,

    /// Column holding the airline code.
    /// Default: `OP_CARRIER`
    #[serde(default = "default_airline_column")]
    pub airline_column: String,

    /// Column holding the flight date.
    /// Default: `FL_DATE`
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Column flagging cancelled flights (non-zero means cancelled).
    /// Default: `CANCELLED`
    #[serde(default = "default_cancelled_column")]
    pub cancelled_column: String,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl StoreConfig {
    /// Structured connection parameters for the `redis` client. The
    /// password is passed through as-is, so reserved URL characters in it
    /// need no escaping.
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..RedisConnectionInfo::default()
            },
        }
    }

    /// `host:port/db`, safe to log.
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
            password: None,
            connect_timeout_ms: default_connect_timeout(),
            response_timeout_ms: default_response_timeout(),
            connect_retries: default_connect_retries(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            airline_column: default_airline_column(),
            date_column: default_date_column(),
            cancelled_column: default_cancelled_column(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_connect_timeout() -> u64 {
    2000
}

fn default_response_timeout() -> u64 {
    1000
}

fn default_connect_retries() -> u32 {
    2
}

fn default_ttl() -> u64 {
    60
}

fn default_key_prefix() -> String {
    "flightcache".to_string()
}

fn default_dataset_path() -> String {
    "flights.csv".to_string()
}

fn default_airline_column() -> String {
    "OP_CARRIER".to_string()
}

fn default_date_column() -> String {
    "FL_DATE".to_string()
}

fn default_cancelled_column() -> String {
    "CANCELLED".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
