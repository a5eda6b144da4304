// ============================================================================
// domain/error.rs - DOCUMENT COMPOSITION ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (so assemblers can hand them up unchanged)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
///
/// Merge precedence conflicts have no variant here: every conflict resolves
/// deterministically (later wins, or concatenate).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Path Errors
    // ========================================================================
    #[error("malformed override path '{path}' at offset {position}: {reason}")]
    MalformedPath {
        path: String,
        position: usize,
        reason: String,
    },

    #[error("invalid path syntax: {reason}")]
    InvalidPathSyntax { reason: String },

    // ========================================================================
    // Shape Errors
    // ========================================================================
    #[error("type conflict at '{path}' in fragment '{fragment}': expected {expected}, found {found}")]
    TypeConflict {
        path: String,
        fragment: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    // ========================================================================
    // Assembler Invariants
    // ========================================================================
    #[error("rule '{rule}' is owned by both '{first}' and '{second}'")]
    RuleOwnershipConflict {
        rule: String,
        first: String,
        second: String,
    },

    #[error("invalid job '{job}': {reason}")]
    InvalidJob { job: String, reason: String },

    #[error("unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },

    #[error("invalid codegen output '{output}': {reason}")]
    InvalidOutput { output: String, reason: String },

    // ========================================================================
    // Artifact Errors
    // ========================================================================
    #[error("invalid artifact '{path}': {reason}")]
    InvalidArtifact { path: String, reason: String },

    #[error("Duplicate artifact path: {path}")]
    DuplicatePath { path: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("unknown artifact format '{0}'")]
    UnknownFormat(String),

    // ========================================================================
    // Fragment Errors
    // ========================================================================
    #[error("invalid fragment '{name}': {reason}")]
    InvalidFragment { name: String, reason: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MalformedPath { path, reason, .. } => vec![
                format!("Path '{}' could not be split into segments: {}", path, reason),
                "Separate segments with '.'".into(),
                "Escape a literal '.' inside a key as '\\.' and a literal '\\' as '\\\\'".into(),
                "Example: generates.schema\\.graphql.documents".into(),
            ],
            Self::TypeConflict {
                path, expected, ..
            } => vec![
                format!("'{}' is merged as a {}", path, expected),
                "Make every fragment supply a list for this key".into(),
                "Or pass --wrap to wrap single values into a list".into(),
            ],
            Self::RuleOwnershipConflict { rule, .. } => vec![
                format!("Remove '{}' from one of the two base rule sets", rule),
                "Quality rules and formatting rules must not overlap".into(),
            ],
            Self::UnknownFormat(format) => vec![
                format!("'{}' is not a supported format", format),
                "Supported formats: json, yaml, toml".into(),
            ],
            Self::UnknownOption { kind, value } => vec![
                format!("'{}' is not a known {}", value, kind),
                "Run with --help to see accepted values".into(),
            ],
            Self::InvalidJob { job, .. } => vec![
                format!("Check the definition of job '{}'", job),
                "Every job needs at least one command step and a runner label".into(),
            ],
            Self::DuplicatePath { path } => vec![
                format!("Two artifacts target '{}'", path),
                "Give each artifact its own output path".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedPath { .. }
            | Self::InvalidPathSyntax { .. }
            | Self::InvalidDocument(_)
            | Self::InvalidJob { .. }
            | Self::UnknownOption { .. }
            | Self::InvalidOutput { .. }
            | Self::InvalidArtifact { .. }
            | Self::AbsolutePathNotAllowed { .. }
            | Self::UnknownFormat(_)
            | Self::InvalidFragment { .. } => ErrorCategory::Validation,
            Self::TypeConflict { .. }
            | Self::RuleOwnershipConflict { .. }
            | Self::DuplicatePath { .. } => ErrorCategory::Conflict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
