//! In-process token store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{CacheError, KeyValueStore};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Map-backed store. Expired entries are dropped when read and by
/// [`MemoryStore::spawn_purge`].
pub struct MemoryStore {
    map: DashMap<String, Entry>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the store going down (or coming back).
    ///
    /// While unavailable every command fails with [`CacheError::Unavailable`]
    /// and `is_alive` reports `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_expired(now));
        before - self.map.len()
    }

    /// Purge `store` every `period` until it is dropped.
    pub fn spawn_purge(store: &Arc<MemoryStore>, period: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(store);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                let purged = store.purge_expired();
                if purged > 0 {
                    debug!("Purged {} expired tokens", purged);
                }
            }
        })
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable("memory store offline".to_string()))
        }
    }

    fn set_with_duration(&self, key: &str, value: &str, ttl: Duration) {
        self.map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_available()?;

        let now = Instant::now();
        let Some(entry) = self.map.get(key) else {
            return Ok(None);
        };
        if entry.is_expired(now) {
            // Release the shard guard before removing.
            drop(entry);
            self.map.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.check_available()?;
        self.set_with_duration(key, value, Duration::from_secs(ttl_secs));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.check_available()?;
        self.map.remove(key);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
