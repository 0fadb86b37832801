//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{token_from_parts, OptionalTokenUser, TokenUser, TOKEN_HEADER};
pub use cors::create_cors_layer;
