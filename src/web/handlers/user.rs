//! User handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::register;
use crate::web::dto::{CreateUserRequest, JsonBody, UserResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::TokenUser;

/// POST /users - Register a new user.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = register(&state.db, &req.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /users/me - The token's user.
pub async fn get_me(TokenUser { user, .. }: TokenUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
