//! Error types module
//!
//! All errors are unified under the [`AppError`] enum. Each variant carries
//! the internal detail; what a caller is allowed to see comes from
//! [`AppError::client_message`], so backend exception detail never crosses
//! the HTTP boundary. Logging happens where the error is translated, with
//! the level chosen by [`AppError::log_level`].

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures
    Debug,
    /// Recoverable or suspicious conditions (ownership mismatches, conflicts)
    Warn,
    /// Unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    /// Credential failure of any kind. The message is the internal cause;
    /// callers only ever see a generic "Unauthorized.".
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed or missing input; the message is safe to show.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage key outside the caller's namespace.
    #[error("Ownership violation: {0}")]
    InvalidKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage credentials or configuration missing.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Storage backend fault; the message here is already client-safe, the
    /// original cause is logged at the point of translation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Duplicate registration, detected by pre-check or by the uniqueness
    /// constraint racing at insert time.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl AppError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Database(_) => 500,
            AppError::Unauthorized(_) => 401,
            AppError::InvalidInput(_) => 400,
            AppError::InvalidKey(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::StorageUnavailable(_) => 500,
            AppError::Storage(_) => 500,
            AppError::Conflict(_) => 409,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code (e.g. "UNAUTHORIZED")
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::InvalidKey(_) => "INVALID_KEY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Sensitive variants collapse to a generic
    /// message; the internal detail stays in the Display impl for logging.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "internal server error.".to_string(),
            AppError::Unauthorized(_) => "Unauthorized.".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::InvalidKey(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::StorageUnavailable(_) => "storage not configured.".to_string(),
            AppError::Storage(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Internal(_) => "internal server error.".to_string(),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::Database(_) => LogLevel::Error,
            AppError::Unauthorized(_) => LogLevel::Debug,
            AppError::InvalidInput(_) => LogLevel::Debug,
            AppError::InvalidKey(_) => LogLevel::Warn,
            AppError::NotFound(_) => LogLevel::Debug,
            AppError::StorageUnavailable(_) => LogLevel::Error,
            AppError::Storage(_) => LogLevel::Error,
            AppError::Conflict(_) => LogLevel::Warn,
            AppError::Internal(_) => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_never_leaks_cause() {
        let err = AppError::Unauthorized("signature verification failed: bad key".to_string());
        assert_eq!(err.http_status_code(), 401);
        assert_eq!(err.client_message(), "Unauthorized.");
        // Internal detail stays available for logging
        assert!(err.to_string().contains("signature verification failed"));
    }

    #[test]
    fn storage_unavailable_is_generic_500() {
        let err = AppError::StorageUnavailable("no credentials in provider chain".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.client_message(), "storage not configured.");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn conflict_is_descriptive_and_not_5xx() {
        let err = AppError::Conflict("File already registered.".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.client_message(), "File already registered.");
    }

    #[test]
    fn ownership_violation_is_400() {
        let err = AppError::InvalidKey("invalid file key.".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_KEY");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }
}
