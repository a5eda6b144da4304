//! Unified error handling for tessera core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for tessera core operations.
#[derive(Debug, Error, Clone)]
pub enum TesseraError {
    /// Errors from the domain layer (malformed paths, shape conflicts, ...).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (serialization, filesystem, store).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),
}

impl TesseraError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Conflict => ErrorCategory::Conflict,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

/// Convenient result type alias.
pub type TesseraResult<T> = Result<T, TesseraError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn domain_category_is_preserved() {
        let err: TesseraError = DomainError::MalformedPath {
            path: "a.".into(),
            position: 2,
            reason: "empty segment".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn rollback_failure_is_internal() {
        let err: TesseraError = ApplicationError::RollbackFailed {
            path: PathBuf::from("/out/a.json"),
            reason: "permission denied".into(),
            cause: "disk full".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(err.to_string().contains("/out/a.json"));
    }
}
