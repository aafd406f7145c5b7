//! Error types for duplex operations

use thiserror::Error;

/// Which adapter produced a storage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Store,
    Cache,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Store => write!(f, "store"),
            Backend::Cache => write!(f, "cache"),
        }
    }
}

/// Storage layer errors.
///
/// Adapters return these verbatim; repositories and services pass them
/// through without adding new kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{backend} connection failed: {reason}")]
    Connection { backend: Backend, reason: String },

    #[error("{backend} operation '{operation}' timed out")]
    Timeout {
        backend: Backend,
        operation: &'static str,
    },

    #[error("{backend} query failed: {reason}")]
    Query { backend: Backend, reason: String },

    #[error("Corrupt value under cache key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Schema ensure failed: {reason}")]
    Schema { reason: String },
}

impl StorageError {
    /// Whether the failure was an expired deadline rather than a broken backend.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StorageError::Timeout { .. })
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Driver not supported: {driver}")]
    DriverNotSupported { driver: String },
}

/// Master error type for all duplex errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DuplexError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

impl DuplexError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DuplexError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type alias for duplex operations.
pub type DuplexResult<T> = Result<T, DuplexError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_timeout() {
        let err = StorageError::Timeout {
            backend: Backend::Cache,
            operation: "GET",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("cache"));
        assert!(msg.contains("GET"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_storage_error_display_connection() {
        let err = StorageError::Connection {
            backend: Backend::Store,
            reason: "refused".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("store connection failed"));
        assert!(msg.contains("refused"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "DUPLEX_REDIS_DB".to_string(),
            value: "x".to_string(),
            reason: "must be an integer".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("DUPLEX_REDIS_DB"));
        assert!(msg.contains("must be an integer"));
    }

    #[test]
    fn test_duplex_error_from_storage() {
        let err: DuplexError = StorageError::Schema {
            reason: "permission denied".to_string(),
        }
        .into();
        assert!(matches!(err, DuplexError::Storage(StorageError::Schema { .. })));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_not_found_display() {
        let err = DuplexError::not_found("Article", 42);
        assert_eq!(err.to_string(), "Article 42 not found");
    }
}
