//! Error types for the file manager.

use thiserror::Error;

use crate::cache::CacheError;

/// Common error type for the file manager.
#[derive(Error, Debug)]
pub enum FilesError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Token store error.
    #[error("token store error: {0}")]
    Cache(#[from] CacheError),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Job queue error.
    #[error("queue error: {0}")]
    Queue(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FilesError {
    fn from(e: sqlx::Error) -> Self {
        FilesError::Database(e.to_string())
    }
}

/// Result type alias for file manager operations.
pub type Result<T> = std::result::Result<T, FilesError>;
