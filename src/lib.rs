//! Files Manager
//!
//! A personal file storage service. Users register, exchange Basic
//! credentials for session tokens, upload files, images and folders, and
//! share them publicly. Image uploads are thumbnailed by a separate worker
//! process fed through a durable job queue.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod queue;
pub mod thumbnail;
pub mod web;

pub use auth::{
    hash_password, register, verify_password, AuthError, IdentityResolver, RegistrationError,
    RegistrationRequest, SessionStore,
};
pub use cache::{CacheError, KeyValueStore, MemoryStore, RedisStore, SharedStore};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{FilesError, Result};
pub use file::{FileError, FileNode, FileService, FileStorage, FileType, ParentRef};
pub use queue::{JobPayload, JobQueue, THUMBNAIL_QUEUE};
pub use thumbnail::{ThumbnailProcessor, ThumbnailWorker, THUMBNAIL_WIDTHS};
