//! Router configuration for the HTTP API.

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    connect, create_user, disconnect, get_file, get_file_data, get_me, get_stats, get_status,
    list_files, publish_file, unpublish_file, upload_file, AppState,
};
use super::middleware::create_cors_layer;

/// Create the API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let app_routes = Router::new()
        .route("/status", get(get_status))
        .route("/stats", get(get_stats));

    let user_routes = Router::new()
        .route("/users", post(create_user))
        .route("/users/me", get(get_me))
        .route("/connect", get(connect))
        .route("/disconnect", get(disconnect));

    let file_routes = Router::new()
        .route("/files", post(upload_file).get(list_files))
        .route("/files/:id", get(get_file))
        .route("/files/:id/publish", put(publish_file))
        .route("/files/:id/unpublish", put(unpublish_file))
        .route("/files/:id/data", get(get_file_data));

    Router::new()
        .merge(app_routes)
        .merge(user_routes)
        .merge(file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}
