// flightcache - Flight delay statistics with Redis-backed result caching
// Author: kelexine (https://github.com/kelexine)

pub mod analyzer;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod utils;
