//! Redis-backed token store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Cmd, FromRedisValue, RedisError};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{CacheError, KeyValueStore};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

struct Inner {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
    alive: AtomicBool,
}

/// Token store on a Redis server.
///
/// The connection is opened on first use, so the store can be built while
/// Redis is down. Once open, the connection manager reconnects on its own.
/// `alive` tracks the outcome of the most recent command or ping.
#[derive(Clone)]
pub struct RedisStore {
    inner: Arc<Inner>,
}

impl RedisStore {
    /// Create a store for the server at `url` without connecting.
    ///
    /// Only a malformed URL is an error.
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                manager: OnceCell::new(),
                alive: AtomicBool::new(false),
            }),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, RedisError> {
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(Some(CONNECT_TIMEOUT))
            .set_response_timeout(Some(RESPONSE_TIMEOUT));
        let manager = self
            .inner
            .manager
            .get_or_try_init(|| async {
                let manager = self
                    .inner
                    .client
                    .get_connection_manager_with_config(config)
                    .await?;
                info!("Connected to Redis");
                Ok::<_, RedisError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, CacheError> {
        let result = match self.connection().await {
            Ok(mut conn) => cmd.query_async::<T>(&mut conn).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => {
                self.inner.alive.store(true, Ordering::SeqCst);
                Ok(value)
            }
            Err(e) => {
                if is_connection_error(&e) {
                    self.inner.alive.store(false, Ordering::SeqCst);
                }
                error!("Redis error: {}", e);
                Err(unavailable(e))
            }
        }
    }

    /// Send a PING and record the outcome. Returns the new alive state.
    pub async fn ping(&self) -> bool {
        let was_alive = self.is_alive();
        let alive = match self.query::<String>(&redis::cmd("PING")).await {
            Ok(_) => true,
            Err(_) => {
                self.inner.alive.store(false, Ordering::SeqCst);
                false
            }
        };
        if alive != was_alive {
            if alive {
                info!("Redis is reachable");
            } else {
                warn!("Redis is unreachable");
            }
        }
        alive
    }

    /// Ping every `period` until the store is dropped.
    pub fn spawn_health_check(&self, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                RedisStore { inner }.ping().await;
            }
        })
    }
}

fn is_connection_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
}

fn unavailable(e: RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.query(redis::cmd("GET").arg(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.query(redis::cmd("SET").arg(key).arg(value).arg("EX").arg(ttl_secs))
            .await
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.query(redis::cmd("DEL").arg(key)).await
    }

    fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }
}
