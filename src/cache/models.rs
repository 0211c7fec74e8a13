//! Cache statistics models.

// Author: kelexine (https://github.com/kelexine)

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local hit/miss counters for one `CacheStore`.
///
/// Each store owns its own instance, so two stores in the same process
/// never share counts.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

impl CacheCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found a live entry.
    pub hits: u64,
    /// Lookups that found nothing, or an entry that could not be decoded.
    pub misses: u64,
    /// Store operations that failed in transport or decoding.
    pub errors: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hits as a percentage of lookups; `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / total as f64
        }
    }
}

/// Snapshot returned by `get_cache_stats`.
///
/// `hits`, `misses` and `hit_ratio` come from the local counters;
/// `total_keys` and `memory_used` are read live from the store and fall
/// back to `None` / `"N/A"` when it cannot be reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub hits: u64,
    pub misses: u64,
    /// Percentage in `[0, 100]`.
    pub hit_ratio: f64,
    /// Keys under this store's prefix; other keys in the database are not counted.
    pub total_keys: Option<u64>,
    pub memory_used: String,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  • hits: {}", self.hits)?;
        writeln!(f, "  • misses: {}", self.misses)?;
        writeln!(f, "  • hit_ratio: {:.1}%", self.hit_ratio)?;
        match self.total_keys {
            Some(keys) => writeln!(f, "  • total_keys: {}", keys)?,
            None => writeln!(f, "  • total_keys: N/A")?,
        }
        write!(f, "  • memory_used: {}", self.memory_used)
    }
}
