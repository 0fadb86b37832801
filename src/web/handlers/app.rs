//! Service status handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::db::UserRepository;
use crate::file::FileNodeRepository;
use crate::web::dto::{StatsResponse, StatusResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /status - Dependency health.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let redis = state.tokens.is_alive();
    let db = state.db.is_alive().await;

    if redis && db {
        Ok((StatusCode::OK, Json(StatusResponse { redis, db })))
    } else {
        tracing::warn!("Status check failed (redis: {}, db: {})", redis, db);
        Err(ApiError::internal(
            "Either Redis or the database is not connected",
        ))
    }
}

/// GET /stats - User and file counts.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let users = UserRepository::new(state.db.pool());
    let files = FileNodeRepository::new(state.db.pool());
    let (users, files) = tokio::try_join!(users.count(), files.count())?;

    Ok(Json(StatsResponse { users, files }))
}
