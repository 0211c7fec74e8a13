// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{AnalyticsError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, applied by the caller)
    /// 2. Environment variables (`FLIGHTCACHE__STORE__PORT=6380`)
    /// 3. Config file (explicit path, else `~/.flightcache/config.toml`)
    /// 4. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p.to_path_buf()).required(true),
            None => File::with_name(&Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("FLIGHTCACHE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AnalyticsError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AnalyticsError::Config(e.to_string()))
    }

    /// Reject settings that can never work. Call once every layer,
    /// including CLI overrides, has been applied.
    pub fn validate(&self) -> Result<()> {
        if self.store.host.trim().is_empty() {
            return Err(AnalyticsError::Config("store.host must not be empty".into()));
        }
        if self.store.port == 0 {
            return Err(AnalyticsError::Config("store.port must be non-zero".into()));
        }
        if self.store.connect_timeout_ms == 0 || self.store.response_timeout_ms == 0 {
            return Err(AnalyticsError::Config(
                "store timeouts must be non-zero".into(),
            ));
        }
        if self.cache.ttl_seconds == 0 || self.cache.ttl_seconds > MAX_TTL_SECONDS {
            return Err(AnalyticsError::Config(format!(
                "cache.ttl_seconds must be between 1 and {}",
                MAX_TTL_SECONDS
            )));
        }
        if self.cache.key_prefix.is_empty() || self.cache.key_prefix.contains(['*', '?', '[']) {
            return Err(AnalyticsError::Config(format!(
                "cache.key_prefix {:?} must be non-empty and free of glob characters",
                self.cache.key_prefix
            )));
        }
        Ok(())
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flightcache")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
