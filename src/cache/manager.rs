// Cache store - key construction, lookup, storage and statistics
// Author: kelexine (https://github.com/kelexine)

use crate::cache::backend::KeyValueStore;
use crate::cache::codec;
use crate::cache::key::{CacheKey, KeyParam};
use crate::cache::models::{CacheCounters, CacheStats, StatsReport};
use crate::cache::redis_store::RedisStore;
use crate::config::{CacheSettings, StoreConfig, MAX_TTL_SECONDS};
use crate::error::{AnalyticsError, Result};
use crate::metrics;
use crate::utils::retry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Memoizes query results in an external key-value store.
///
/// Cloning is cheap and clones share the connection and the counters.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
    counters: Arc<CacheCounters>,
    prefix: String,
    ttl: Duration,
}

impl CacheStore {
    /// Connect to Redis, retrying transient failures a bounded number of
    /// times. Returns `Connection` once the attempts are used up.
    pub async fn connect(store: &StoreConfig, settings: &CacheSettings) -> Result<Self> {
        let backoff = retry::create_backoff(Duration::from_millis(200));
        let backend = retry::with_retry("Redis connect", store.connect_retries, backoff, || {
            RedisStore::connect(store)
        })
        .await?;

        Self::with_backend(Arc::new(backend), settings)
    }

    /// Build a store over any backend.
    pub fn with_backend(backend: Arc<dyn KeyValueStore>, settings: &CacheSettings) -> Result<Self> {
        if settings.ttl_seconds == 0 || settings.ttl_seconds > MAX_TTL_SECONDS {
            return Err(AnalyticsError::Config(format!(
                "cache TTL must be between 1 and {} seconds",
                MAX_TTL_SECONDS
            )));
        }
        if settings.key_prefix.is_empty() {
            return Err(AnalyticsError::Config("cache key prefix must not be empty".into()));
        }

        Ok(Self {
            backend,
            counters: Arc::new(CacheCounters::default()),
            prefix: settings.key_prefix.clone(),
            ttl: Duration::from_secs(settings.ttl_seconds),
        })
    }

    /// The TTL this store was configured with.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive the key for a query within this store's namespace.
    pub fn build_key(&self, query_type: &str, column: &str, params: &[(&str, KeyParam)]) -> CacheKey {
        CacheKey::build(&self.prefix, query_type, column, params)
    }

    /// Look up a cached result.
    ///
    /// `Ok(None)` is a miss. A value that cannot be decoded counts as a miss
    /// and is reported as `Serialization`; transport problems are reported
    /// as `Connection` and count as neither hit nor miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let raw = match self.backend.get(key.as_str()).await {
            Ok(raw) => raw,
            Err(e) => {
                self.counters.record_error();
                metrics::record_cache_error();
                return Err(e);
            }
        };

        let Some(raw) = raw else {
            self.counters.record_miss();
            metrics::record_cache_miss();
            info!("Cache MISS for key: {}", key.short());
            return Ok(None);
        };

        match codec::decode(&raw) {
            Ok(value) => {
                self.counters.record_hit();
                metrics::record_cache_hit();
                info!("Cache HIT for key: {}", key.short());
                Ok(Some(value))
            }
            Err(e) => {
                self.counters.record_miss();
                self.counters.record_error();
                metrics::record_cache_miss();
                metrics::record_cache_error();
                warn!("Undecodable cache entry {}: {}", key.short(), e);
                Err(e)
            }
        }
    }

    /// Serialize and store a result, replacing whatever was there.
    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) -> Result<()> {
        if ttl.as_secs() == 0 || ttl.as_secs() > MAX_TTL_SECONDS {
            return Err(AnalyticsError::Config(format!(
                "TTL {:?} is outside 1s..={}s",
                ttl, MAX_TTL_SECONDS
            )));
        }

        let result = match codec::encode(value) {
            Ok(raw) => self.backend.set_ex(key.as_str(), raw, ttl).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                metrics::record_cache_set();
                info!("Cache SET for key: {} with TTL: {}s", key.short(), ttl.as_secs());
                Ok(())
            }
            Err(e) => {
                self.counters.record_error();
                metrics::record_cache_error();
                Err(e)
            }
        }
    }

    /// Remove one entry. True if something was removed.
    pub async fn delete(&self, key: &CacheKey) -> Result<bool> {
        let removed = self.backend.delete(key.as_str()).await.inspect_err(|_| {
            self.counters.record_error();
            metrics::record_cache_error();
        })?;
        info!("Cache DELETE for key: {} (removed: {})", key.short(), removed);
        Ok(removed)
    }

    /// Remove every entry in this store's namespace, returning the count.
    /// Keys belonging to other applications sharing the database survive.
    pub async fn clear_all(&self) -> Result<u64> {
        let pattern = format!("{}:*", self.prefix);
        let removed = self.backend.delete_matching(&pattern).await.inspect_err(|_| {
            self.counters.record_error();
            metrics::record_cache_error();
        })?;
        metrics::record_cache_clear();
        info!("Cleared {} cache entries under {}", removed, pattern);
        Ok(removed)
    }

    /// Remaining lifetime of an entry; `None` when it is gone.
    pub async fn ttl_remaining(&self, key: &CacheKey) -> Result<Option<Duration>> {
        self.backend.ttl(key.as_str()).await
    }

    /// Local counters only, no store round trip.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Counters plus live memory and the number of keys in this store's
    /// namespace, the same set `clear_all` removes.
    pub async fn get_stats(&self) -> StatsReport {
        let local = self.counters.snapshot();

        let pattern = format!("{}:*", self.prefix);
        let total_keys = match self.backend.count_matching(&pattern).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Could not read key count from store: {}", e);
                None
            }
        };
        let memory_used = self.backend.memory_used().await.unwrap_or_else(|e| {
            warn!("Could not read memory usage from store: {}", e);
            "N/A".to_string()
        });

        StatsReport {
            hits: local.hits,
            misses: local.misses,
            hit_ratio: local.hit_ratio(),
            total_keys,
            memory_used,
        }
    }

    pub fn reset_stats(&self) {
        debug!("Resetting cache counters");
        self.counters.reset();
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryStore;
    use std::collections::BTreeMap;

    fn store_with(backend: Arc<MemoryStore>) -> CacheStore {
        CacheStore::with_backend(backend, &CacheSettings::default()).unwrap()
    }

    fn sample() -> BTreeMap<String, f64> {
        BTreeMap::from([("AA".to_string(), 15.0), ("BA".to_string(), 5.0)])
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let settings = CacheSettings {
            ttl_seconds: 0,
            ..CacheSettings::default()
        };
        let result = CacheStore::with_backend(Arc::new(MemoryStore::new()), &settings);
        assert!(matches!(result, Err(AnalyticsError::Config(_))));
    }

    #[tokio::test]
    async fn test_oversized_ttl_rejected() {
        let settings = CacheSettings {
            ttl_seconds: u64::MAX,
            ..CacheSettings::default()
        };
        let result = CacheStore::with_backend(Arc::new(MemoryStore::new()), &settings);
        assert!(matches!(result, Err(AnalyticsError::Config(_))));

        let cache = store_with(Arc::new(MemoryStore::new()));
        let key = cache.build_key("avg_delay", "ARR_DELAY", &[]);
        let result = cache.set(&key, &sample(), Duration::from_secs(u64::MAX)).await;
        assert!(matches!(result, Err(AnalyticsError::Config(_))));
        assert_eq!(cache.get::<BTreeMap<String, f64>>(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = store_with(Arc::new(MemoryStore::new()));
        let key = cache.build_key("avg_delay", "ARR_DELAY", &[]);

        assert_eq!(cache.get::<BTreeMap<String, f64>>(&key).await.unwrap(), None);
        cache.set(&key, &sample(), cache.ttl()).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(sample()));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = store_with(Arc::new(MemoryStore::new()));
        let key = cache.build_key("avg_delay", "ARR_DELAY", &[]);

        cache.set(&key, &sample(), cache.ttl()).await.unwrap();
        let replacement = BTreeMap::from([("ZZ".to_string(), 1.0)]);
        cache.set(&key, &replacement, cache.ttl()).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss_and_an_error() {
        let backend = Arc::new(MemoryStore::new());
        let cache = store_with(backend.clone());
        let key = cache.build_key("avg_delay", "ARR_DELAY", &[]);
        backend
            .set_ex(key.as_str(), "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let err = cache.get::<BTreeMap<String, f64>>(&key).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::Serialization(_)));
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1, errors: 1 });
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_not_missed() {
        let backend = Arc::new(MemoryStore::new());
        let cache = store_with(backend.clone());
        let key = cache.build_key("avg_delay", "ARR_DELAY", &[]);
        backend.close();

        let err = cache.get::<BTreeMap<String, f64>>(&key).await.unwrap_err();
        assert!(err.is_connection());
        assert!(cache.set(&key, &sample(), cache.ttl()).await.unwrap_err().is_connection());
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 0, errors: 2 });
    }

    #[tokio::test]
    async fn test_delete_and_ttl_remaining() {
        let cache = store_with(Arc::new(MemoryStore::new()));
        let key = cache.build_key("avg_delay", "ARR_DELAY", &[]);
        cache.set(&key, &sample(), Duration::from_secs(30)).await.unwrap();

        let remaining = cache.ttl_remaining(&key).await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(30));
        assert!(remaining > Duration::from_secs(25));

        assert!(cache.delete(&key).await.unwrap());
        assert!(!cache.delete(&key).await.unwrap());
        assert_eq!(cache.ttl_remaining(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_own_prefix() {
        let backend = Arc::new(MemoryStore::new());
        let cache = store_with(backend.clone());
        backend
            .set_ex("someone-else:key", "1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        for column in ["ARR_DELAY", "DEP_DELAY"] {
            let key = cache.build_key("avg_delay", column, &[]);
            cache.set(&key, &sample(), cache.ttl()).await.unwrap();
        }

        assert_eq!(cache.get_stats().await.total_keys, Some(2));
        assert_eq!(cache.clear_all().await.unwrap(), 2);
        assert_eq!(backend.count_matching("*").await.unwrap(), 1);
        assert_eq!(cache.get_stats().await.total_keys, Some(0));
    }

    #[tokio::test]
    async fn test_stats_report_degrades_when_store_is_down() {
        let backend = Arc::new(MemoryStore::new());
        let cache = store_with(backend.clone());
        backend.close();

        let report = cache.get_stats().await;
        assert_eq!(report.total_keys, None);
        assert_eq!(report.memory_used, "N/A");
        assert_eq!(report.hit_ratio, 0.0);
    }

    #[tokio::test]
    async fn test_independent_stores_have_isolated_counters() {
        let a = store_with(Arc::new(MemoryStore::new()));
        let b = store_with(Arc::new(MemoryStore::new()));
        let key = a.build_key("avg_delay", "ARR_DELAY", &[]);

        let _ = a.get::<BTreeMap<String, f64>>(&key).await.unwrap();
        assert_eq!(a.stats().misses, 1);
        assert_eq!(b.stats().misses, 0);
    }
}
