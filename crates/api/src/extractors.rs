//! Request extractors that reject with [`ApiError`] bodies.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts},
    http::{HeaderName, HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::ApiError;

/// Request header carrying a client-chosen idempotency key.
pub static IDEMPOTENCY_KEY: HeaderName = HeaderName::from_static("idempotency-key");

/// Response header set when a stored result is replayed.
pub static IDEMPOTENT_REPLAYED: HeaderName = HeaderName::from_static("idempotent-replayed");

const MAX_KEY_LEN: usize = 128;

/// JSON body; malformed input becomes `VALIDATION_ERROR`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; malformed input becomes `VALIDATION_ERROR`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string; malformed input becomes `VALIDATION_ERROR`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The optional `Idempotency-Key` header.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(Option<String>);

impl IdempotencyKey {
    /// The key, if the client sent one.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(&IDEMPOTENCY_KEY) else {
            return Ok(Self(None));
        };
        let key = value
            .to_str()
            .map_err(|_| ApiError::validation("Idempotency-Key must be printable ASCII"))?
            .trim();
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(ApiError::validation(format!(
                "Idempotency-Key must be 1 to {MAX_KEY_LEN} characters"
            )));
        }
        Ok(Self(Some(key.to_string())))
    }
}

/// A JSON response that carries `Idempotent-Replayed: true` when `replayed`.
pub fn replayable<T: Serialize>(status: StatusCode, replayed: bool, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    if replayed {
        response
            .headers_mut()
            .insert(IDEMPOTENT_REPLAYED.clone(), HeaderValue::from_static("true"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<IdempotencyKey, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("Idempotency-Key", value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        IdempotencyKey::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_key_is_optional_and_trimmed() {
        assert_eq!(extract(None).await.unwrap().as_deref(), None);
        assert_eq!(extract(Some(" abc-1 ")).await.unwrap().as_deref(), Some("abc-1"));
    }

    #[tokio::test]
    async fn test_blank_or_oversized_key_is_rejected() {
        assert!(extract(Some("   ")).await.is_err());
        assert!(extract(Some(&"k".repeat(MAX_KEY_LEN + 1))).await.is_err());
    }

    #[test]
    fn test_replay_header() {
        let fresh = replayable(StatusCode::OK, false, "x");
        assert!(fresh.headers().get(&IDEMPOTENT_REPLAYED).is_none());
        let replayed = replayable(StatusCode::OK, true, "x");
        assert_eq!(replayed.headers()[&IDEMPOTENT_REPLAYED], "true");
    }
}
