// Key-value store abstraction
// Author: kelexine (https://github.com/kelexine)

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// The subset of Redis semantics the cache relies on.
///
/// Implementations must report transport problems as
/// `AnalyticsError::Connection`; a missing or expired key is `Ok(None)`.
/// Expiry is the implementation's job, the cache never evicts on its own.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `GET`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `SET key value EX ttl`, replacing any previous value.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// `DEL`; true when a key was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every key matching a glob pattern, returning how many went.
    async fn delete_matching(&self, pattern: &str) -> Result<u64>;

    /// `TTL`; `None` when the key is missing or has no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Number of live keys matching a glob pattern (`SCAN MATCH`).
    async fn count_matching(&self, pattern: &str) -> Result<u64>;

    /// Human-readable memory usage (`used_memory_human`).
    async fn memory_used(&self) -> Result<String>;

    /// `PING`
    async fn ping(&self) -> Result<()>;
}
