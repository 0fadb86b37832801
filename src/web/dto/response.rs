//! Response DTOs.

use serde::Serialize;

use crate::db::User;
use crate::file::FileNode;

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// GET /connect response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// File node projection.
///
/// `parentId` is 0 for root-level nodes. The storage path is never exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: &'static str,
    pub is_public: bool,
    pub parent_id: i64,
}

impl From<&FileNode> for FileResponse {
    fn from(node: &FileNode) -> Self {
        Self {
            id: node.id,
            user_id: node.user_id,
            name: node.name.clone(),
            file_type: node.file_type.as_str(),
            is_public: node.is_public,
            parent_id: node.parent().id(),
        }
    }
}

/// GET /status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub redis: bool,
    pub db: bool,
}

/// GET /stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub users: i64,
    pub files: i64,
}
