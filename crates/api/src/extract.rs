//! Extractors whose rejections use the API error body.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON request body. A missing, malformed or mistyped body is rejected with
/// `400 INVALID_BODY` instead of axum's plain-text response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
