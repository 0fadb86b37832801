//! File handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::file::{parse_page, ParentRef};
use crate::web::dto::{FileDataQuery, FileResponse, JsonBody, ListFilesQuery, UploadRequest};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{OptionalTokenUser, TokenUser};

/// Node ids are positive integers; anything else names nothing.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(ApiError::not_found)
}

/// POST /files - Upload a file, image or folder.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    TokenUser { user, .. }: TokenUser,
    JsonBody(req): JsonBody<UploadRequest>,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let node = state.files.create(user.id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(FileResponse::from(&node))))
}

/// GET /files/:id - One of the user's nodes.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    TokenUser { user, .. }: TokenUser,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let id = parse_id(&id)?;
    let node = state.files.get(user.id, id).await?;
    Ok(Json(FileResponse::from(&node)))
}

/// GET /files?parentId=&page= - One page of the user's nodes.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    TokenUser { user, .. }: TokenUser,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let parent = match query.parent_id.as_deref().filter(|p| !p.is_empty()) {
        None => None,
        Some(raw) => match ParentRef::parse_str(raw) {
            Some(parent) => Some(parent),
            None => return Ok(Json(Vec::new())),
        },
    };
    let page = parse_page(query.page.as_deref());

    let nodes = state.files.list(user.id, parent, page).await?;
    Ok(Json(nodes.iter().map(FileResponse::from).collect()))
}

/// PUT /files/:id/publish
pub async fn publish_file(
    State(state): State<Arc<AppState>>,
    TokenUser { user, .. }: TokenUser,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    set_public(&state, user.id, &id, true).await
}

/// PUT /files/:id/unpublish
pub async fn unpublish_file(
    State(state): State<Arc<AppState>>,
    TokenUser { user, .. }: TokenUser,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    set_public(&state, user.id, &id, false).await
}

async fn set_public(
    state: &AppState,
    owner: i64,
    raw_id: &str,
    value: bool,
) -> Result<Json<FileResponse>, ApiError> {
    let id = parse_id(raw_id)?;
    let node = state.files.set_public(owner, id, value).await?;
    Ok(Json(FileResponse::from(&node)))
}

/// GET /files/:id/data?size= - Raw content, anonymous when public.
pub async fn get_file_data(
    State(state): State<Arc<AppState>>,
    OptionalTokenUser(user): OptionalTokenUser,
    Path(id): Path<String>,
    Query(query): Query<FileDataQuery>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let requester = user.map(|u| u.id);

    let content = state
        .files
        .read_content(requester, id, query.size.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content.content_type)],
        content.bytes,
    )
        .into_response())
}
