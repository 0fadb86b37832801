//! File service.
//!
//! Validates uploads, persists nodes and bytes, enforces ownership and
//! visibility, and hands image uploads to the thumbnail queue.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::{debug, info, warn};

use super::{
    FileError, FileNode, FileNodeRepository, FileStorage, FileType, NewFileNode, ParentRef,
    DEFAULT_CONTENT_TYPE,
};
use crate::db::Database;
use crate::queue::{JobPayload, JobQueue};

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Upload request as received.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub name: Option<String>,
    /// Raw `type` value; validated by [`FileService::create`].
    pub file_type: Option<String>,
    pub is_public: bool,
    /// Requested parent. `None` means the request named something that
    /// cannot be a node id.
    pub parent: Option<ParentRef>,
    /// Base64 content.
    pub data: Option<String>,
}

impl Upload {
    /// A private root-level upload.
    pub fn new(name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            file_type: Some(file_type.into()),
            is_public: false,
            parent: Some(ParentRef::Root),
            data: None,
        }
    }

    /// Set the base64 content.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the parent.
    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set visibility.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }
}

/// Bytes of a stored file and how to label them.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Content type for a file name.
pub fn content_type_for(name: &str) -> String {
    match mime_guess::from_path(name).first() {
        Some(mime) if mime.type_() == mime_guess::mime::TEXT => {
            format!("{}; charset=utf-8", mime.essence_str())
        }
        Some(mime) => mime.essence_str().to_string(),
        None => DEFAULT_CONTENT_TYPE.to_string(),
    }
}

/// File operations on behalf of users.
#[derive(Debug, Clone)]
pub struct FileService {
    db: Database,
    storage: FileStorage,
    queue: JobQueue,
}

impl FileService {
    /// Create a file service.
    pub fn new(db: Database, storage: FileStorage, queue: JobQueue) -> Self {
        Self { db, storage, queue }
    }

    /// Disk storage used for uploads.
    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Create a folder, file or image owned by `owner`.
    ///
    /// Checks run in a fixed order and the first failure wins: name, type,
    /// data (not needed for folders), parent. Image uploads are queued for
    /// thumbnails; a queueing failure is logged and does not fail the upload.
    pub async fn create(&self, owner: i64, upload: Upload) -> Result<FileNode, FileError> {
        let name = upload
            .name
            .filter(|n| !n.is_empty())
            .ok_or(FileError::Invalid("Missing name"))?;
        let file_type: FileType = upload
            .file_type
            .as_deref()
            .ok_or(FileError::Invalid("Missing type"))?
            .parse()?;
        let data = upload.data.filter(|d| !d.is_empty());
        if data.is_none() && file_type.has_content() {
            return Err(FileError::Invalid("Missing data"));
        }

        let parent = upload.parent.ok_or(FileError::Invalid("Parent not found"))?;
        let repo = FileNodeRepository::new(self.db.pool());
        if let ParentRef::Folder(parent_id) = parent {
            let parent_node = repo
                .get_by_id(parent_id)
                .await?
                .ok_or(FileError::Invalid("Parent not found"))?;
            if parent_node.file_type != FileType::Folder {
                return Err(FileError::Invalid("Parent is not a folder"));
            }
        }

        self.storage.ensure_base_dir().await?;

        let mut new_node = NewFileNode::new(owner, name, file_type)
            .with_public(upload.is_public)
            .with_parent(parent);

        let mut saved = None;
        if let (true, Some(data)) = (file_type.has_content(), data) {
            let bytes = decode_data(&data)?;
            let path = self.storage.save(&bytes).await?;
            new_node = new_node.with_local_path(path.to_string_lossy());
            saved = Some(path);
        }

        let node = match repo.create(&new_node).await {
            Ok(node) => node,
            Err(e) => {
                if let Some(path) = saved {
                    if let Err(cleanup) = FileStorage::remove(&path).await {
                        warn!("Could not remove {}: {}", path.display(), cleanup);
                    }
                }
                return Err(e.into());
            }
        };
        info!(
            "User {} created {} '{}' (id {})",
            owner, node.file_type, node.name, node.id
        );

        if node.file_type == FileType::Image {
            self.enqueue_thumbnails(owner, node.id).await;
        }

        Ok(node)
    }

    async fn enqueue_thumbnails(&self, owner: i64, file_id: i64) {
        let payload = JobPayload::thumbnail(owner, file_id);
        if let Err(e) = self.queue.enqueue(&payload).await {
            warn!("Could not queue '{}': {}", payload.name, e);
        }
    }

    /// Get an owned node.
    pub async fn get(&self, owner: i64, id: i64) -> Result<FileNode, FileError> {
        FileNodeRepository::new(self.db.pool())
            .get_owned(id, owner)
            .await?
            .ok_or(FileError::NotFound)
    }

    /// One page of `owner`'s nodes, optionally under a single parent.
    pub async fn list(
        &self,
        owner: i64,
        parent: Option<ParentRef>,
        page: u32,
    ) -> Result<Vec<FileNode>, FileError> {
        let nodes = FileNodeRepository::new(self.db.pool())
            .list(owner, parent, page)
            .await?;
        debug!("Listed {} nodes for user {} (page {})", nodes.len(), owner, page);
        Ok(nodes)
    }

    /// Publish or unpublish an owned node.
    pub async fn set_public(
        &self,
        owner: i64,
        id: i64,
        value: bool,
    ) -> Result<FileNode, FileError> {
        let node = FileNodeRepository::new(self.db.pool())
            .set_public(id, owner, value)
            .await?
            .ok_or(FileError::NotFound)?;
        info!("File {} is now {}", id, if value { "public" } else { "private" });
        Ok(node)
    }

    /// Read a file's bytes, or one of its thumbnails when `size` is given.
    ///
    /// Public nodes are readable by anyone; private nodes only by their
    /// owner. Everything else is reported as not found.
    pub async fn read_content(
        &self,
        requester: Option<i64>,
        id: i64,
        size: Option<&str>,
    ) -> Result<FileContent, FileError> {
        let node = FileNodeRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .filter(|n| n.is_public || Some(n.user_id) == requester)
            .ok_or(FileError::NotFound)?;

        if node.file_type == FileType::Folder {
            return Err(FileError::FolderHasNoContent);
        }

        let local_path = node.local_path.as_deref().ok_or(FileError::NotFound)?;
        let path = match size.filter(|s| !s.is_empty()) {
            Some(size) if size.bytes().all(|b| b.is_ascii_digit()) => {
                FileStorage::derivative_path(local_path, size)
            }
            Some(_) => return Err(FileError::NotFound),
            None => local_path.into(),
        };

        let bytes = FileStorage::read_regular_file(&path)
            .await?
            .ok_or(FileError::NotFound)?;

        Ok(FileContent {
            bytes,
            content_type: content_type_for(&node.name),
        })
    }
}

fn decode_data(data: &str) -> Result<Vec<u8>, FileError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT_BASE64
        .decode(compact)
        .map_err(|_| FileError::Invalid("Invalid data"))
}
