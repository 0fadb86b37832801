//! Session handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};

use crate::web::dto::TokenResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::TokenUser;

/// GET /connect - Exchange Basic credentials for a token.
pub async fn connect(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = state.identity.connect(authorization).await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /disconnect - Revoke the current token.
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    TokenUser { user, token }: TokenUser,
) -> Result<StatusCode, ApiError> {
    state.identity.disconnect(&user, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}
