//! Disk storage for file contents.
//!
//! Every upload gets a fresh UUID v4 name directly under the base
//! directory. Thumbnails sit next to their original as
//! `<original>_<width>`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::Result;

/// File storage rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for file storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// Nothing is created on disk until [`ensure_base_dir`](Self::ensure_base_dir)
    /// or [`save`](Self::save).
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Create the base directory (and parents) if missing.
    pub async fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    /// Save content under a new random name and return its full path.
    pub async fn save(&self, content: &[u8]) -> Result<PathBuf> {
        self.ensure_base_dir().await?;

        let path = self.base_path.join(Uuid::new_v4().to_string());
        fs::write(&path, content).await?;
        Ok(path)
    }

    /// Path of the `size` derivative of the file at `path`.
    pub fn derivative_path(path: impl AsRef<Path>, size: impl std::fmt::Display) -> PathBuf {
        let mut name = OsString::from(path.as_ref().as_os_str());
        name.push(format!("_{size}"));
        PathBuf::from(name)
    }

    /// Read a regular file.
    ///
    /// Returns `Ok(None)` if `path` is missing or is not a regular file.
    pub async fn read_regular_file(path: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
        let path = path.as_ref();
        match fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        match fs::read(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `content` to `path`, replacing any existing file.
    pub async fn write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
        fs::write(path, content).await?;
        Ok(())
    }

    /// Delete the file at `path`. A missing file is not an error.
    pub async fn remove(path: impl AsRef<Path>) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
