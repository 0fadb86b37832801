//! Request identity resolution.
//!
//! Two distinct paths exist and callers rely on their different failure
//! shapes:
//! - [`IdentityResolver::connect`] exchanges Basic credentials for a token
//!   and fails hard with [`AuthError::Unauthorized`].
//! - [`IdentityResolver::get_user`] turns an optional `X-Token` into an
//!   optional user and never fails on a missing or stale token.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::{debug, info};

use super::password::verify_password;
use super::session::SessionStore;
use crate::db::{Database, User, UserRepository};
use crate::FilesError;

/// Identity errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing, malformed or wrong credential or token.
    #[error("Unauthorized")]
    Unauthorized,

    /// A backing store failed.
    #[error(transparent)]
    Internal(#[from] FilesError),
}

impl From<crate::cache::CacheError> for AuthError {
    fn from(e: crate::cache::CacheError) -> Self {
        AuthError::Internal(e.into())
    }
}

/// Basic credentials extracted from an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

/// Parse `Basic <base64(email:password)>`.
///
/// The header must be exactly two space-separated parts. The decoded pair
/// is split at the first `:`, so passwords may contain colons.
pub fn parse_basic_credentials(header: &str) -> Option<BasicCredentials> {
    let mut parts = header.split(' ');
    let (scheme, encoded) = (parts.next()?, parts.next()?);
    if scheme != "Basic" || parts.next().is_some() {
        return None;
    }

    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Resolves request credentials into users.
#[derive(Clone)]
pub struct IdentityResolver {
    db: Database,
    sessions: SessionStore,
}

impl IdentityResolver {
    /// Create a resolver over the metadata database and session store.
    pub fn new(db: Database, sessions: SessionStore) -> Self {
        Self { db, sessions }
    }

    /// Verify Basic credentials without minting a token.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<User, AuthError> {
        let credentials = authorization
            .and_then(parse_basic_credentials)
            .ok_or(AuthError::Unauthorized)?;

        let user = UserRepository::new(self.db.pool())
            .get_by_email(&credentials.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !verify_password(&credentials.password, &user.password) {
            debug!("Password mismatch for {}", credentials.email);
            return Err(AuthError::Unauthorized);
        }

        Ok(user)
    }

    /// Exchange Basic credentials for a new session token.
    pub async fn connect(&self, authorization: Option<&str>) -> Result<String, AuthError> {
        let user = self.authenticate(authorization).await?;
        let token = self.sessions.create(user.id).await?;
        info!("User {} connected", user.id);
        Ok(token)
    }

    /// Resolve an optional `X-Token` to an optional user.
    ///
    /// Absent token, unknown token and deleted user all yield `Ok(None)`.
    /// Store failures are errors.
    pub async fn get_user(&self, token: Option<&str>) -> Result<Option<User>, FilesError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let Some(user_id) = self.sessions.resolve(token).await? else {
            return Ok(None);
        };
        UserRepository::new(self.db.pool()).get_by_id(user_id).await
    }

    /// Resolve a token that must identify a user.
    pub async fn require_user(&self, token: Option<&str>) -> Result<User, AuthError> {
        self.get_user(token).await?.ok_or(AuthError::Unauthorized)
    }

    /// Revoke `token`, already resolved to `user`.
    ///
    /// The deletion is idempotent.
    pub async fn disconnect(&self, user: &User, token: &str) -> Result<(), AuthError> {
        self.sessions.revoke(token).await?;
        info!("User {} disconnected", user.id);
        Ok(())
    }
}
