//! File storage.
//!
//! This module provides the file side of the service:
//! - File node model and repository (folders, files, images)
//! - Disk storage under random names
//! - The file service enforcing hierarchy, ownership and visibility

mod node;
mod service;
mod storage;

pub use node::{FileNode, FileNodeRepository, NewFileNode};
pub use service::{FileContent, FileService, Upload};
pub use storage::FileStorage;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::FilesError;

/// Number of nodes per listing page.
pub const PAGE_SIZE: u32 = 20;

/// Stored `parent_id` of a root-level node.
pub const ROOT_PARENT_ID: i64 = 0;

/// Content type used when the name does not map to a known type.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// File service errors.
///
/// Display strings are the client-facing messages.
#[derive(Error, Debug)]
pub enum FileError {
    /// Rejected upload input.
    #[error("{0}")]
    Invalid(&'static str),

    /// Content requested for a folder.
    #[error("A folder doesn't have content")]
    FolderHasNoContent,

    /// Missing, foreign or private node.
    #[error("Not found")]
    NotFound,

    /// Storage failure.
    #[error(transparent)]
    Internal(#[from] FilesError),
}

impl From<sqlx::Error> for FileError {
    fn from(e: sqlx::Error) -> Self {
        FileError::Internal(e.into())
    }
}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        FileError::Internal(e.into())
    }
}

/// Kind of file node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum FileType {
    Folder,
    File,
    Image,
}

impl FileType {
    /// Wire and storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Folder => "folder",
            FileType::File => "file",
            FileType::Image => "image",
        }
    }

    /// Whether nodes of this type carry bytes on disk.
    pub fn has_content(&self) -> bool {
        !matches!(self, FileType::Folder)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(FileType::Folder),
            "file" => Ok(FileType::File),
            "image" => Ok(FileType::Image),
            _ => Err(FileError::Invalid("Missing type")),
        }
    }
}

/// Parent of a file node.
///
/// Parsed once at the request boundary; the rest of the crate never sees
/// the raw `parentId` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    Root,
    Folder(i64),
}

impl ParentRef {
    /// Build from a stored `parent_id` column.
    pub fn from_id(id: i64) -> Self {
        if id == ROOT_PARENT_ID {
            ParentRef::Root
        } else {
            ParentRef::Folder(id)
        }
    }

    /// Stored `parent_id` column value.
    pub fn id(&self) -> i64 {
        match self {
            ParentRef::Root => ROOT_PARENT_ID,
            ParentRef::Folder(id) => *id,
        }
    }

    /// Parse a query-string reference. `"0"` is the root.
    ///
    /// Returns `None` for text that cannot name any node.
    pub fn parse_str(raw: &str) -> Option<Self> {
        let id: i64 = raw.trim().parse().ok()?;
        if id < 0 {
            return None;
        }
        Some(Self::from_id(id))
    }

    /// Parse a JSON `parentId`.
    ///
    /// Absent, `null`, `false`, `0`, `"0"` and `""` are the root. Returns
    /// `None` for values that cannot name any node.
    pub fn from_json(value: Option<&Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Some(ParentRef::Root),
            Some(Value::String(s)) if s.is_empty() => Some(ParentRef::Root),
            Some(Value::String(s)) => Self::parse_str(s),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(id) if id >= 0 => Some(Self::from_id(id)),
                _ => None,
            },
            Some(_) => None,
        }
    }
}

/// Parse a `page` query value the lenient way: leading digits count,
/// anything else (including negatives) is page 0.
pub fn parse_page(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return 0;
    };
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
