//! Application layer errors.
//!
//! These errors represent failures in orchestration, not document logic.
//! Document logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The serializer could not render a document.
    #[error("Failed to serialize artifact {artifact}: {reason}")]
    SerializationFailed { artifact: String, reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Fragment store error")]
    StoreLockError,

    /// No fragment with this name is known.
    #[error("Fragment not found: {name}")]
    FragmentNotFound { name: String },

    /// Synthesis refused to clobber an existing file.
    #[error("Artifact already exists at {path}")]
    ArtifactExists { path: PathBuf },

    /// A write failed and a file created earlier in the run could not be
    /// removed afterwards.
    #[error("Rollback failed for {path} after write error ({cause}): {reason}")]
    RollbackFailed {
        path: PathBuf,
        reason: String,
        cause: String,
    },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::SerializationFailed { artifact, .. } => vec![
                format!("Artifact '{}' could not be rendered", artifact),
                "TOML cannot represent null values; remove them or choose json/yaml".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::StoreLockError => vec![
                "The fragment store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::FragmentNotFound { name } => vec![
                format!("No fragment named '{}'", name),
                "Try: tessera fragments list to see available fragments".into(),
            ],
            Self::ArtifactExists { path } => vec![
                format!("File already exists: {}", path.display()),
                "Use --force to overwrite (destructive)".into(),
                "Or write to a different path with --out".into(),
            ],
            Self::RollbackFailed { path, .. } => vec![
                format!("A partially written file was left behind: {}", path.display()),
                "Remove it by hand before running again".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FragmentNotFound { .. } => ErrorCategory::NotFound,
            Self::FilesystemError { .. } | Self::RollbackFailed { .. } => ErrorCategory::Internal,
            Self::StoreLockError => ErrorCategory::Internal,
            Self::SerializationFailed { .. } => ErrorCategory::Validation,
            Self::ArtifactExists { .. } => ErrorCategory::Conflict,
        }
    }
}
