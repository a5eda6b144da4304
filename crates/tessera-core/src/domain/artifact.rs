use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::document::ConfigDocument;
use super::error::{DomainError, DomainResult};

/// Comment placed at the top of generated YAML and TOML files.
pub const DEFAULT_MARKER: &str = "Generated by tessera. Do not edit by hand.";

// ── ArtifactFormat ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl ArtifactFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yml",
            Self::Toml => "toml",
        }
    }

    /// Whether the format has a comment syntax for the generated-file marker.
    pub const fn supports_comments(&self) -> bool {
        !matches!(self, Self::Json)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| DomainError::UnknownFormat(s.to_string()))
    }
}

// ── ArtifactPath ─────────────────────────────────────────────────────────────

/// Output path of an artifact, relative to the project root.
///
/// Invariant: never absolute, never escapes the root with `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPath(PathBuf);

impl ArtifactPath {
    /// # Panics
    /// Panics if the path is not a valid artifact path (use `try_new` for fallible).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        assert!(
            Self::check(&path).is_ok(),
            "ArtifactPath must be relative and stay inside the root: {:?}",
            path
        );
        Self(path)
    }

    pub fn try_new(path: impl Into<PathBuf>) -> DomainResult<Self> {
        let path = path.into();
        Self::check(&path)?;
        Ok(Self(path))
    }

    fn check(path: &Path) -> DomainResult<()> {
        if path.is_absolute() || path.has_root() {
            return Err(DomainError::AbsolutePathNotAllowed {
                path: path.display().to_string(),
            });
        }
        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidArtifact {
                path: String::new(),
                reason: "path cannot be empty".into(),
            });
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(DomainError::InvalidArtifact {
                path: path.display().to_string(),
                reason: "path cannot contain '..'".into(),
            });
        }
        Ok(())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn parent(&self) -> Option<&Path> {
        self.0.parent().filter(|p| !p.as_os_str().is_empty())
    }

    pub fn format(&self) -> Option<ArtifactFormat> {
        ArtifactFormat::from_path(&self.0)
    }
}

impl AsRef<Path> for ArtifactPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

// ── Artifact ─────────────────────────────────────────────────────────────────

/// A finished document bound to an output path and format.
///
/// Never mutated after construction; synthesis only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    path: ArtifactPath,
    format: ArtifactFormat,
    document: ConfigDocument,
    marker: Option<String>,
}

impl Artifact {
    /// Create an artifact whose format is inferred from the path extension.
    pub fn new(path: &str, document: ConfigDocument) -> DomainResult<Self> {
        let path = ArtifactPath::try_new(path)?;
        let format = path.format().ok_or_else(|| DomainError::InvalidArtifact {
            path: path.to_string(),
            reason: "cannot infer format from extension; use json, yaml, yml or toml".into(),
        })?;
        Ok(Self::with_format(path, format, document))
    }

    pub fn with_format(path: ArtifactPath, format: ArtifactFormat, document: ConfigDocument) -> Self {
        Self {
            path,
            format,
            document,
            marker: None,
        }
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn path(&self) -> &ArtifactPath {
        &self.path
    }

    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn marker_text(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Empty documents are not written.
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.format)
    }
}
