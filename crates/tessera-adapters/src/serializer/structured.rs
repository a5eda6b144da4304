//! JSON, YAML and TOML rendering for artifacts.
//!
//! Output is deterministic: key order is the document's insertion order and
//! every file ends with a single newline. Formats with comment syntax get the
//! artifact's marker as leading `#` lines.

use tracing::debug;

use tessera_core::{
    application::{ApplicationError, ports::DocumentSerializer},
    domain::{Artifact, ArtifactFormat, ConfigDocument},
    error::TesseraResult,
};

/// Serializer covering every [`ArtifactFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredSerializer;

impl StructuredSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Render a bare document without a marker.
    pub fn render(format: ArtifactFormat, document: &ConfigDocument) -> Result<String, String> {
        let body = match format {
            ArtifactFormat::Json => {
                serde_json::to_string_pretty(document).map_err(|e| e.to_string())?
            }
            ArtifactFormat::Yaml => serde_yaml::to_string(document).map_err(|e| e.to_string())?,
            ArtifactFormat::Toml => toml::to_string(document).map_err(|e| e.to_string())?,
        };
        Ok(ensure_trailing_newline(body))
    }
}

impl DocumentSerializer for StructuredSerializer {
    fn serialize(&self, artifact: &Artifact) -> TesseraResult<String> {
        let body = Self::render(artifact.format(), artifact.document()).map_err(|reason| {
            ApplicationError::SerializationFailed {
                artifact: artifact.path().to_string(),
                reason,
            }
        })?;

        let content = match artifact.marker_text() {
            Some(marker) if artifact.format().supports_comments() => {
                format!("{}\n{}", comment_block(marker), body)
            }
            _ => body,
        };

        debug!(artifact = %artifact, bytes = content.len(), "artifact serialized");
        Ok(content)
    }
}

fn comment_block(marker: &str) -> String {
    marker
        .lines()
        .map(|line| {
            if line.is_empty() {
                "#".to_string()
            } else {
                format!("# {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ensure_trailing_newline(mut s: String) -> String {
    while s.ends_with("\n\n") {
        s.pop();
    }
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
