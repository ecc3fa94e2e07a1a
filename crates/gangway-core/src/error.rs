//! Error types for account store operations.
//!
//! This module provides the error taxonomy shared by every user manager
//! backend: argument rejection, authentication failure, configuration
//! problems, timeouts, and a catch-all for directory faults.

use thiserror::Error;

/// Main error type for account store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required input is missing or empty; raised before any directory access
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Credential verification failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Directory, pool, or mapping fault
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Specialized result type for account store operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::OperationFailed(_) => "OPERATION_FAILED",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(self, Self::ConfigError(_) | Self::OperationFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::InvalidArgument("test".to_string()).error_code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            Error::AuthenticationFailed("test".to_string()).error_code(),
            "AUTHENTICATION_FAILED"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::OperationFailed("test".to_string()).error_code(),
            "OPERATION_FAILED"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("name is empty".to_string());
        assert_eq!(err.to_string(), "Invalid argument: name is empty");

        let err = Error::AuthenticationFailed("bind rejected".to_string());
        assert_eq!(err.to_string(), "Authentication failed: bind rejected");
    }

    #[test]
    fn test_should_log() {
        assert!(Error::ConfigError("test".to_string()).should_log());
        assert!(Error::OperationFailed("test".to_string()).should_log());

        assert!(!Error::InvalidArgument("test".to_string()).should_log());
        assert!(!Error::AuthenticationFailed("test".to_string()).should_log());
        assert!(!Error::Timeout("test".to_string()).should_log());
    }

    #[test]
    fn test_error_clone_and_eq() {
        let err = Error::OperationFailed("test".to_string());
        let cloned = err.clone();
        assert_eq!(err, cloned);
        assert_ne!(err, Error::OperationFailed("other".to_string()));
    }
}
