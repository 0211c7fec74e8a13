// CLI module for flightcache
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// flightcache - flight delay statistics served through a Redis cache
#[derive(Parser, Debug)]
#[command(name = "flightcache", version, about, long_about = None)]
pub struct Args {
    /// TOML config file (default: ~/.flightcache/config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Flight CSV to analyze
    #[arg(long, env = "CSV_PATH")]
    pub csv: Option<String>,

    /// Seconds each cached result lives
    #[arg(long, env = "CACHE_TTL")]
    pub ttl: Option<u64>,

    /// Redis host
    #[arg(long, env = "REDIS_HOST")]
    pub host: Option<String>,

    /// Redis port
    #[arg(long, env = "REDIS_PORT")]
    pub port: Option<u16>,

    /// Clear cached results before running the queries
    #[arg(long)]
    pub clear: bool,

    /// How many times each query is run
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    pub metrics: bool,
}

impl Args {
    /// CLI flags take precedence over file and environment configuration.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(csv) = &self.csv {
            config.dataset.path = csv.clone();
        }
        if let Some(ttl) = self.ttl {
            config.cache.ttl_seconds = ttl;
        }
        if let Some(host) = &self.host {
            config.store.host = host.clone();
        }
        if let Some(port) = self.port {
            config.store.port = port;
        }
    }
}
