//! Request body size limit.
//!
//! `RequestBodyLimitLayer` answers oversized bodies with a bare 413, either
//! up front from `Content-Length` or once a streamed body crosses the limit.
//! [`BodyLimitErrorLayer`] sits outside it and turns that answer into the
//! gateway's JSON `InvalidRequest` error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower::util::MapResponseLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::domain::error::ApiError;

/// Map layer that rewrites body-limit rejections.
pub type BodyLimitErrorLayer = MapResponseLayer<fn(Response) -> Response>;

/// Limit layer for `max_bytes`.
pub fn body_limit_layer(max_bytes: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max_bytes)
}

/// Layer applying [`reject_oversized_body`]; add it after [`body_limit_layer`].
pub fn body_limit_error_layer() -> BodyLimitErrorLayer {
    MapResponseLayer::new(reject_oversized_body as fn(Response) -> Response)
}

/// 413 from the limit becomes `InvalidRequest`; anything else passes through.
pub fn reject_oversized_body(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::invalid_request().into_response()
    } else {
        response
    }
}
