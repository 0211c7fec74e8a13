// Cache management module
// Author: kelexine (https://github.com/kelexine)

pub mod backend;
pub mod codec;
pub mod key;
pub mod manager;
pub mod memory;
pub mod models;
pub mod redis_store;

pub use backend::KeyValueStore;
pub use key::{CacheKey, KeyParam};
pub use manager::CacheStore;
pub use memory::MemoryStore;
pub use models::{CacheCounters, CacheStats, StatsReport};
pub use redis_store::RedisStore;
