// Redis-backed key-value store
// Author: kelexine (https://github.com/kelexine)

use crate::cache::backend::KeyValueStore;
use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

const SCAN_BATCH: usize = 500;

/// Redis connection shared by every query.
///
/// `ConnectionManager` is cheap to clone and reconnects on its own; every
/// command is still bounded by the response timeout so a dead server turns
/// into an error instead of a hang.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    response_timeout: Duration,
}

impl RedisStore {
    /// Open a connection, failing once `connect_timeout_ms` has elapsed.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        debug!("Opening Redis client for {}", config.endpoint());

        let client = redis::Client::open(config.connection_info())?;
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client)).await??;

        let store = Self {
            conn,
            response_timeout: Duration::from_millis(config.response_timeout_ms),
        };
        store.ping().await?;

        info!("Connected to Redis at {}", config.endpoint());
        Ok(store)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        Ok(tokio::time::timeout(self.response_timeout, fut).await??)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded(conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = self.bounded(conn.del::<_, u64>(key)).await?;
        Ok(removed > 0)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        // SCAN instead of KEYS so a large keyspace never blocks the server.
        loop {
            let (next, keys): (u64, Vec<String>) = self
                .bounded(
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;

            if !keys.is_empty() {
                removed += self.bounded(conn.del::<_, u64>(keys)).await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.conn.clone();
        let secs: i64 = self.bounded(conn.ttl::<_, i64>(key)).await?;
        // -2: no such key, -1: no expiry
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    async fn count_matching(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut count: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = self
                .bounded(
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;
            count += keys.len() as u64;

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(count)
    }

    async fn memory_used(&self) -> Result<String> {
        let mut conn = self.conn.clone();
        let info: String = self
            .bounded(redis::cmd("INFO").arg("memory").query_async::<String>(&mut conn))
            .await?;
        Ok(parse_info_field(&info, "used_memory_human").unwrap_or_else(|| "N/A".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = self
            .bounded(redis::cmd("PING").query_async::<String>(&mut conn))
            .await?;
        Ok(())
    }
}

/// Pull one `field:value` line out of an `INFO` reply.
pub fn parse_info_field(info: &str, field: &str) -> Option<String> {
    info.lines()
        .filter_map(|line| line.trim().split_once(':'))
        .find(|(name, _)| *name == field)
        .map(|(_, value)| value.to_string())
}
