//! Session tokens kept in the token store.
//!
//! A session is a single key `auth_<token>` whose value is the user id.
//! Expiry is left entirely to the store.

use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheError, SharedStore};

/// Session lifetime (24 hours).
pub const SESSION_TTL_SECS: u64 = 24 * 60 * 60;

const KEY_PREFIX: &str = "auth_";

/// Token store key for a session token.
pub fn session_key(token: &str) -> String {
    format!("{KEY_PREFIX}{token}")
}

/// Issues, resolves and revokes session tokens.
#[derive(Clone)]
pub struct SessionStore {
    store: SharedStore,
    ttl_secs: u64,
}

impl SessionStore {
    /// Create a session store with the default lifetime.
    pub fn new(store: SharedStore) -> Self {
        Self::with_ttl(store, SESSION_TTL_SECS)
    }

    /// Create a session store with a custom lifetime.
    pub fn with_ttl(store: SharedStore, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    /// Mint a new token for `user_id`.
    ///
    /// A user may hold any number of live tokens.
    pub async fn create(&self, user_id: i64) -> Result<String, CacheError> {
        let token = Uuid::new_v4().to_string();
        self.store
            .set(&session_key(&token), &user_id.to_string(), self.ttl_secs)
            .await?;
        debug!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Look up the user id behind `token`.
    ///
    /// Unknown, expired and malformed entries all resolve to `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<i64>, CacheError> {
        let value = self.store.get(&session_key(token)).await?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    /// Delete `token`. Revoking an unknown token succeeds.
    pub async fn revoke(&self, token: &str) -> Result<(), CacheError> {
        self.store.del(&session_key(token)).await
    }
}
