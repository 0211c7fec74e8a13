// In-process key-value store with TTL expiry
// Author: kelexine (https://github.com/kelexine)
//
// Behaves like the subset of Redis the cache uses. It can be closed to
// simulate a store that went away, after which every call fails with a
// connection error.

use crate::cache::backend::KeyValueStore;
use crate::error::{AnalyticsError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses every operation, as if the server were down.
    pub fn unreachable() -> Self {
        let store = Self::new();
        store.close();
        store
    }

    pub fn close(&self) {
        debug!("Closing in-memory store");
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(AnalyticsError::Connection("store connection closed".to_string()))
        } else {
            Ok(())
        }
    }

    /// Drop expired entries; mirrors Redis lazily expiring on access.
    fn purge_expired(entries: &mut HashMap<String, Entry>, now: Instant) {
        entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, Instant::now());
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.ensure_open()?;
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| AnalyticsError::Config(format!("TTL {:?} is out of range", ttl)))?;
        self.entries
            .lock()
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, Instant::now());
        Ok(entries.remove(key).is_some())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64> {
        self.ensure_open()?;
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, Instant::now());
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        Ok((before - entries.len()) as u64)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, now);
        Ok(entries.get(key).map(|entry| entry.expires_at - now))
    }

    async fn count_matching(&self, pattern: &str) -> Result<u64> {
        self.ensure_open()?;
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, Instant::now());
        Ok(entries.keys().filter(|key| glob_match(pattern, key)).count() as u64)
    }

    async fn memory_used(&self) -> Result<String> {
        self.ensure_open()?;
        let entries = self.entries.lock();
        let bytes: usize = entries
            .iter()
            .map(|(key, entry)| key.len() + entry.value.len())
            .sum();
        Ok(format_bytes(bytes as u64))
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }
}

/// Redis-style glob supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}

/// Format a byte count the way Redis reports `used_memory_human`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];
    if bytes < 1024 {
        return format!("{}B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{:.2}{}", value, unit)
}
