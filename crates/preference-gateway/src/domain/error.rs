//! HTTP error mapping for service errors.
//!
//! Every failure leaves the gateway as `{"code","message","description"}`
//! with a status derived from the error kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use preference_service::{ErrorType, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub description: String,
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message().to_string(),
            description: err.description().to_string(),
        }
    }
}

/// A service error on its way out as an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    pub fn invalid_request() -> Self {
        Self(ServiceError::InvalidRequest)
    }

    pub fn unauthenticated() -> Self {
        Self(ServiceError::AuthenticationFailed)
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidKey
            | ServiceError::InvalidValue
            | ServiceError::InvalidRequest => StatusCode::BAD_REQUEST,
            ServiceError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0.error_type() {
            ErrorType::Server => warn!(code = self.0.code(), %status, "request failed"),
            ErrorType::Client => debug!(code = self.0.code(), %status, "request rejected"),
        }
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving, not per request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(String),

    /// Metrics registry could not be built
    #[error("metrics error: {0}")]
    Metrics(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidKey, StatusCode::BAD_REQUEST),
            (ServiceError::InvalidValue, StatusCode::BAD_REQUEST),
            (ServiceError::InvalidRequest, StatusCode::BAD_REQUEST),
            (ServiceError::InternalError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status, "{err:?}");
        }
    }

    #[test]
    fn test_error_body_fields() {
        let body = ErrorResponse::from(ServiceError::NotFound);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "PREF-4001");
        assert_eq!(json["message"], "Preference not found");
        assert_eq!(json["description"], "The requested preference does not exist");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ApiError::invalid_request().to_string(),
            "[PREF-4004] Invalid request"
        );
    }

    #[test]
    fn test_into_response_sets_status() {
        let response = ApiError::unauthenticated().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
