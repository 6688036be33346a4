//! Error types for the preference service
//!
//! Two layers:
//! - [`StoreError`]: what a backend reports. `NotFound` is a domain outcome,
//!   everything else is an infrastructure failure.
//! - [`ServiceError`]: what callers see. Each kind carries fixed metadata
//!   (code, message, description) used by the gateway when rendering errors.

use thiserror::Error;

/// Whether an error is caused by the caller or by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Caller can fix the request; never retried.
    Client,
    /// Unexpected failure behind the service boundary.
    Server,
}

/// Caller-visible service errors.
///
/// No variant carries backend detail (SQL text, driver messages); those are
/// logged where the failure is observed and dropped here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ServiceError {
    /// No caller identity was supplied. Raised by the gateway, not the service.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The requested key does not exist for this user.
    #[error("Preference not found")]
    NotFound,

    /// Key is blank or longer than the allowed maximum.
    #[error("Invalid preference key")]
    InvalidKey,

    /// Value is longer than the allowed maximum.
    #[error("Invalid preference value")]
    InvalidValue,

    /// Request body or path could not be interpreted. Raised by the gateway.
    #[error("Invalid request")]
    InvalidRequest,

    /// Any store or transaction failure.
    #[error("Internal server error")]
    InternalError,
}

impl ServiceError {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            ServiceError::AuthenticationFailed => "PREF-4000",
            ServiceError::NotFound => "PREF-4001",
            ServiceError::InvalidKey => "PREF-4002",
            ServiceError::InvalidValue => "PREF-4003",
            ServiceError::InvalidRequest => "PREF-4004",
            ServiceError::InternalError => "PREF-5000",
        }
    }

    /// Short human readable message.
    pub const fn message(&self) -> &'static str {
        match self {
            ServiceError::AuthenticationFailed => "Authentication failed",
            ServiceError::NotFound => "Preference not found",
            ServiceError::InvalidKey => "Invalid preference key",
            ServiceError::InvalidValue => "Invalid preference value",
            ServiceError::InvalidRequest => "Invalid request",
            ServiceError::InternalError => "Internal server error",
        }
    }

    /// Longer description returned to API clients.
    pub const fn description(&self) -> &'static str {
        match self {
            ServiceError::AuthenticationFailed => "User authentication is required",
            ServiceError::NotFound => "The requested preference does not exist",
            ServiceError::InvalidKey => {
                "The preference key is invalid or exceeds maximum length"
            }
            ServiceError::InvalidValue => "The preference value exceeds maximum length",
            ServiceError::InvalidRequest => "The request is invalid or missing required fields",
            ServiceError::InternalError => {
                "An unexpected error occurred while processing the request"
            }
        }
    }

    /// Client or server side.
    pub const fn error_type(&self) -> ErrorType {
        match self {
            ServiceError::InternalError => ErrorType::Server,
            _ => ErrorType::Client,
        }
    }
}

/// Errors reported by store backends and transactioners.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Zero rows matched (reads) or were affected (deletes).
    #[error("preference not found")]
    NotFound,

    /// Query failed.
    #[error("database error: {0}")]
    Database(String),

    /// Begin, commit or rollback failed.
    #[error("transaction error: {0}")]
    Transaction(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
