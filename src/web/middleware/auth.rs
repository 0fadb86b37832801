//! Token authentication extractors.
//!
//! Sessions are identified by the `X-Token` header. Handlers that need a
//! user take [`TokenUser`]; handlers that merely care who is asking take
//! [`OptionalTokenUser`].

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::db::User;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Session token header.
pub const TOKEN_HEADER: &str = "x-token";

/// Read the raw `X-Token` value.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Extractor for token-authenticated users.
///
/// Rejects with 401 before the handler runs when the token is missing,
/// unknown or expired.
#[derive(Debug, Clone)]
pub struct TokenUser {
    pub user: User,
    /// The token that identified the user.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for TokenUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or_else(ApiError::unauthorized)?;
        let user = state.identity.require_user(Some(&token)).await?;
        Ok(TokenUser { user, token })
    }
}

/// Optional authentication extractor.
///
/// Similar to [`TokenUser`] but a missing or stale token yields `None`.
/// Token store failures still reject.
#[derive(Debug, Clone)]
pub struct OptionalTokenUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalTokenUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts);
        let user = state.identity.get_user(token.as_deref()).await?;
        Ok(OptionalTokenUser(user))
    }
}
