//! `MessagePack` request body extractor.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::error::{ErrorDetail, ErrorResponse};

/// Why a body could not be turned into the requested type
#[derive(Debug)]
pub struct MsgPackRejection {
    message: String,
}

impl MsgPackRejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for MsgPackRejection {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: "DESERIALIZATION_ERROR",
                message: self.message.clone(),
            },
        };

        match rmp_serde::to_vec_named(&body) {
            Ok(bytes) => (
                StatusCode::BAD_REQUEST,
                [("content-type", "application/msgpack")],
                bytes,
            )
                .into_response(),
            Err(_) => (StatusCode::BAD_REQUEST, self.message).into_response(),
        }
    }
}

/// Decodes a `MessagePack` body into `T`.
///
/// Accepts `application/msgpack`, `application/x-msgpack` or no content
/// type at all.
pub struct MsgPackExtractor<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for MsgPackExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = MsgPackRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.is_empty() && !content_type.contains("msgpack") {
            return Err(MsgPackRejection::new(format!(
                "Invalid content type: expected application/msgpack, got {content_type}"
            )));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| MsgPackRejection::new(format!("Failed to read request body: {e}")))?;

        rmp_serde::from_slice(&bytes)
            .map(MsgPackExtractor)
            .map_err(|e| MsgPackRejection::new(format!("Failed to deserialize MessagePack: {e}")))
    }
}
