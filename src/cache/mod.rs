//! Token store: a key/value store with per-key expiry.
//!
//! Session tokens live here, not in the metadata database. Two backends
//! implement [`KeyValueStore`]:
//! - [`RedisStore`] for deployments (shared by every server process)
//! - [`MemoryStore`] for tests and single-node development

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{CacheBackend, CacheConfig};

/// Token store errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store could not be reached or rejected the command.
    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous key/value store with expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl_secs` seconds.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Last known connection state. Never fails.
    fn is_alive(&self) -> bool;
}

/// Shared handle to a token store.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Build the configured token store and start its background check.
///
/// A Redis server that is down at startup is not an error: the store
/// reports itself as not alive until a ping gets through.
pub async fn connect(config: &CacheConfig) -> Result<SharedStore, CacheError> {
    let period = Duration::from_secs(config.check_interval_secs);
    match config.backend {
        CacheBackend::Redis => {
            let store = RedisStore::open(&config.url)?;
            if !store.ping().await {
                tracing::warn!("Redis at {} is not reachable yet", config.url);
            }
            store.spawn_health_check(period);
            Ok(Arc::new(store))
        }
        CacheBackend::Memory => {
            tracing::warn!("Using in-process token store; sessions are lost on restart");
            let store = Arc::new(MemoryStore::new());
            MemoryStore::spawn_purge(&store, period);
            Ok(store)
        }
    }
}
