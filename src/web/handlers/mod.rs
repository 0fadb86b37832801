//! API handlers.

pub mod app;
pub mod auth;
pub mod file;
pub mod user;

pub use app::*;
pub use auth::*;
pub use file::*;
pub use user::*;

use crate::auth::{IdentityResolver, SessionStore};
use crate::cache::SharedStore;
use crate::db::Database;
use crate::file::{FileService, FileStorage};
use crate::queue::JobQueue;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Metadata database.
    pub db: Database,
    /// Token store.
    pub tokens: SharedStore,
    /// Credential and token resolution.
    pub identity: IdentityResolver,
    /// File operations.
    pub files: FileService,
}

impl AppState {
    /// Wire the services together.
    pub fn new(db: Database, tokens: SharedStore, storage: FileStorage, queue: JobQueue) -> Self {
        let identity = IdentityResolver::new(db.clone(), SessionStore::new(tokens.clone()));
        let files = FileService::new(db.clone(), storage, queue);
        Self {
            db,
            tokens,
            identity,
            files,
        }
    }
}
