use std::collections::HashSet;

use crate::domain::{
    artifact::Artifact,
    document::Fragment,
    error::{DomainError, DomainResult},
};

/// Centralized domain validation.
///
/// Checks that span several values live here rather than on the values.
pub struct DomainValidator;

impl DomainValidator {
    /// No two artifacts may target the same output path.
    pub fn validate_artifacts(artifacts: &[Artifact]) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for artifact in artifacts {
            if !seen.insert(artifact.path().as_path()) {
                return Err(DomainError::DuplicatePath {
                    path: artifact.path().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fragment names are `/`-separated words such as `lint/react`.
    pub fn validate_fragment_name(name: &str) -> DomainResult<()> {
        let invalid = |reason: &str| DomainError::InvalidFragment {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if name.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
            return Err(invalid("name segments must be non-empty and cannot be '.' or '..'"));
        }
        if name.chars().any(|c| c.is_whitespace() || c == '\\') {
            return Err(invalid("name cannot contain whitespace or '\\'"));
        }
        Ok(())
    }

    pub fn validate_fragment(fragment: &Fragment) -> DomainResult<()> {
        Self::validate_fragment_name(fragment.name())
    }

    /// Fragment lists handed to an assembler must not repeat a name.
    pub fn validate_fragment_list(fragments: &[Fragment]) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for fragment in fragments {
            Self::validate_fragment(fragment)?;
            if !seen.insert(fragment.name()) {
                return Err(DomainError::InvalidFragment {
                    name: fragment.name().to_string(),
                    reason: "fragment listed more than once".into(),
                });
            }
        }
        Ok(())
    }
}
