//! File node model and repository.

use sqlx::SqlitePool;

use super::{FileType, ParentRef, PAGE_SIZE};
use crate::{FilesError, Result};

const NODE_COLUMNS: &str =
    "id, user_id, name, type, is_public, parent_id, local_path, created_at";

/// A folder, file or image record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileNode {
    /// Unique node ID (never 0).
    pub id: i64,
    /// Owner's user ID.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Node kind.
    #[sqlx(rename = "type")]
    pub file_type: FileType,
    /// Readable without a token.
    pub is_public: bool,
    /// Parent folder ID, 0 for root.
    pub parent_id: i64,
    /// Bytes on disk; `None` for folders.
    pub local_path: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl FileNode {
    /// Parent as a typed reference.
    pub fn parent(&self) -> ParentRef {
        ParentRef::from_id(self.parent_id)
    }
}

/// Data for creating a new node.
#[derive(Debug, Clone)]
pub struct NewFileNode {
    pub user_id: i64,
    pub name: String,
    pub file_type: FileType,
    pub is_public: bool,
    pub parent: ParentRef,
    pub local_path: Option<String>,
}

impl NewFileNode {
    /// A private root-level node with no content.
    pub fn new(user_id: i64, name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            user_id,
            name: name.into(),
            file_type,
            is_public: false,
            parent: ParentRef::Root,
            local_path: None,
        }
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = parent;
        self
    }

    /// Set visibility.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Set the on-disk location.
    pub fn with_local_path(mut self, path: impl Into<String>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

/// Repository for file nodes.
pub struct FileNodeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileNodeRepository<'a> {
    /// Create a new FileNodeRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a node.
    pub async fn create(&self, node: &NewFileNode) -> Result<FileNode> {
        let result = sqlx::query(
            "INSERT INTO files (user_id, name, type, is_public, parent_id, local_path)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(node.user_id)
        .bind(&node.name)
        .bind(node.file_type.as_str())
        .bind(node.is_public)
        .bind(node.parent.id())
        .bind(&node.local_path)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FilesError::NotFound("file".to_string()))
    }

    /// Get a node by ID regardless of owner.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileNode>> {
        let node = sqlx::query_as::<_, FileNode>(&format!(
            "SELECT {NODE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(node)
    }

    /// Get a node by ID only if `owner` owns it.
    pub async fn get_owned(&self, id: i64, owner: i64) -> Result<Option<FileNode>> {
        let node = sqlx::query_as::<_, FileNode>(&format!(
            "SELECT {NODE_COLUMNS} FROM files WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(node)
    }

    /// One page of `owner`'s nodes in creation order, optionally under a
    /// single parent.
    pub async fn list(
        &self,
        owner: i64,
        parent: Option<ParentRef>,
        page: u32,
    ) -> Result<Vec<FileNode>> {
        let offset = i64::from(page) * i64::from(PAGE_SIZE);

        let nodes = match parent {
            Some(parent) => {
                sqlx::query_as::<_, FileNode>(&format!(
                    "SELECT {NODE_COLUMNS} FROM files
                     WHERE user_id = ? AND parent_id = ?
                     ORDER BY id LIMIT ? OFFSET ?"
                ))
                .bind(owner)
                .bind(parent.id())
                .bind(i64::from(PAGE_SIZE))
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, FileNode>(&format!(
                    "SELECT {NODE_COLUMNS} FROM files
                     WHERE user_id = ?
                     ORDER BY id LIMIT ? OFFSET ?"
                ))
                .bind(owner)
                .bind(i64::from(PAGE_SIZE))
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(nodes)
    }

    /// Set visibility of an owned node. Returns `None` if `owner` has no
    /// such node.
    pub async fn set_public(&self, id: i64, owner: i64, value: bool) -> Result<Option<FileNode>> {
        let node = sqlx::query_as::<_, FileNode>(&format!(
            "UPDATE files SET is_public = ? WHERE id = ? AND user_id = ?
             RETURNING {NODE_COLUMNS}"
        ))
        .bind(value)
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(node)
    }

    /// Total number of nodes.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
