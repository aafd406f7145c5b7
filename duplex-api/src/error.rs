//! Error Types for duplex API
//!
//! This module defines error handling for the transport layer:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse for the HTTP mount, `From<ApiError> for Status` for gRPC
//!
//! This is the only place where domain error kinds meet protocol statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use duplex_core::{ConfigError, DuplexError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tonic::{Code, Status};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each code maps to one HTTP status and one gRPC status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Required field is missing or blank
    MissingField,

    /// Request body or parameter could not be decoded
    InvalidInput,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Operation conflicts with the listener's current state
    StateConflict,

    // ========================================================================
    // Server Errors (500, 503, 504)
    // ========================================================================
    /// Internal server error (including recovered panics)
    InternalError,

    /// A store or cache operation failed
    StorageFailed,

    /// A backend could not be reached
    ServiceUnavailable,

    /// Operation timed out
    Timeout,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::MissingField | ErrorCode::InvalidInput => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,
            ErrorCode::StateConflict => StatusCode::CONFLICT,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::InternalError | ErrorCode::StorageFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the gRPC status code for this error code.
    pub fn rpc_code(&self) -> Code {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::MissingField | ErrorCode::InvalidInput => {
                Code::InvalidArgument
            }
            ErrorCode::EntityNotFound => Code::NotFound,
            ErrorCode::StateConflict => Code::FailedPrecondition,
            ErrorCode::ServiceUnavailable => Code::Unavailable,
            ErrorCode::Timeout => Code::DeadlineExceeded,
            ErrorCode::InternalError | ErrorCode::StorageFailed => Code::Internal,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::StateConflict => "Operation conflicts with current state",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageFailed => "Storage operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::Timeout => "Operation timed out",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
///
/// The same value flows out of both mounts. On gRPC, `rpc_status` is filled
/// in by the status translation stage; an untranslated error surfaces as
/// `Code::Unknown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    #[serde(skip)]
    pub rpc_status: Option<Code>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            rpc_status: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the gRPC status for this error's code.
    pub fn translated(mut self) -> Self {
        self.rpc_status = Some(self.code.rpc_code());
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// The gRPC code this error will be sent with.
    pub fn rpc_status(&self) -> Code {
        self.rpc_status.unwrap_or(Code::Unknown)
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create an EntityNotFound error.
    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Create a Timeout error.
    pub fn timeout(operation: &str) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Operation '{}' timed out", operation),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// TRANSPORT INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

impl From<ApiError> for Status {
    fn from(err: ApiError) -> Self {
        Status::new(err.rpc_status(), err.message)
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::Connection { backend, .. } => {
                tracing::warn!(error = %err, "backend unreachable");
                ApiError::service_unavailable(format!("The {} is unavailable", backend))
            }
            StorageError::Timeout { backend, operation } => ApiError::new(
                ErrorCode::Timeout,
                format!("The {} did not answer '{}' in time", backend, operation),
            ),
            StorageError::Query { .. }
            | StorageError::Corrupt { .. }
            | StorageError::Schema { .. } => {
                // Keep backend detail in the log, out of the response.
                tracing::error!(error = %err, "storage operation failed");
                ApiError::from_code(ErrorCode::StorageFailed)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
            ValidationError::InvalidValue { field, reason } => {
                ApiError::validation_failed(format!("Invalid value for {}: {}", field, reason))
                    .with_details(serde_json::json!({ "field": field }))
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal_error(format!("Configuration error: {}", err))
    }
}

impl From<DuplexError> for ApiError {
    fn from(err: DuplexError) -> Self {
        match err {
            DuplexError::Storage(e) => e.into(),
            DuplexError::Validation(e) => e.into(),
            DuplexError::Config(e) => e.into(),
            DuplexError::NotFound { entity, id } => ApiError::entity_not_found(entity, id),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use duplex_core::Backend;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::EntityNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_error_code_rpc_mapping() {
        assert_eq!(ErrorCode::MissingField.rpc_code(), Code::InvalidArgument);
        assert_eq!(ErrorCode::EntityNotFound.rpc_code(), Code::NotFound);
        assert_eq!(ErrorCode::StorageFailed.rpc_code(), Code::Internal);
        assert_eq!(ErrorCode::ServiceUnavailable.rpc_code(), Code::Unavailable);
        assert_eq!(ErrorCode::Timeout.rpc_code(), Code::DeadlineExceeded);
    }

    #[test]
    fn test_untranslated_error_is_unknown_on_grpc() {
        let status: Status = ApiError::entity_not_found("article", 7).into();
        assert_eq!(status.code(), Code::Unknown);

        let status: Status = ApiError::entity_not_found("article", 7).translated().into();
        assert_eq!(status.code(), Code::NotFound);
        assert!(status.message().contains("7"));
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: ApiError = DuplexError::from(StorageError::Connection {
            backend: Backend::Cache,
            reason: "refused".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);

        let err: ApiError = StorageError::Timeout {
            backend: Backend::Store,
            operation: "article_get",
        }
        .into();
        assert_eq!(err.code, ErrorCode::Timeout);

        let err: ApiError = StorageError::Corrupt {
            key: "like:1".to_string(),
            reason: "not a number".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::StorageFailed);
        assert!(!err.message.contains("like:1"));
    }

    #[test]
    fn test_validation_and_not_found_mapping() {
        let err: ApiError = DuplexError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("title"));

        let err: ApiError = DuplexError::not_found("article", 42).into();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::missing_field("name").translated();
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("MISSING_FIELD"));
        assert!(!json.contains("rpc_status"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized.code, err.code);
        assert_eq!(deserialized.rpc_status, None);
        Ok(())
    }
}
