//! Request DTOs.

use serde::Deserialize;
use serde_json::Value;

use crate::auth::RegistrationRequest;
use crate::file::{ParentRef, Upload};

/// POST /users body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<CreateUserRequest> for RegistrationRequest {
    fn from(req: CreateUserRequest) -> Self {
        RegistrationRequest {
            email: req.email,
            password: req.password,
        }
    }
}

/// POST /files body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    /// Any JSON value; truthiness decides.
    pub is_public: Option<Value>,
    /// Number, numeric string, `0`/`"0"` or absent for root.
    pub parent_id: Option<Value>,
    /// Base64 content.
    pub data: Option<String>,
}

impl From<UploadRequest> for Upload {
    fn from(req: UploadRequest) -> Self {
        Upload {
            name: req.name,
            file_type: req.file_type,
            is_public: req.is_public.as_ref().is_some_and(is_truthy),
            parent: ParentRef::from_json(req.parent_id.as_ref()),
            data: req.data,
        }
    }
}

/// Loose JSON truthiness: `false`, `0`, `""` and `null` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// GET /files query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesQuery {
    pub parent_id: Option<String>,
    pub page: Option<String>,
}

/// GET /files/:id/data query.
#[derive(Debug, Default, Deserialize)]
pub struct FileDataQuery {
    pub size: Option<String>,
}
