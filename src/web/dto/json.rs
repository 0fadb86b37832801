//! Lenient JSON body extractor.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::web::error::ApiError;

/// A JSON extractor that tolerates a missing body and content type.
///
/// An empty body deserializes as `{}`, so every field is absent and the
/// handler reports the first missing one. Malformed JSON is a 400.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid body: {e}")))?;

        let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(raw)
            .map(JsonBody)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))
    }
}
