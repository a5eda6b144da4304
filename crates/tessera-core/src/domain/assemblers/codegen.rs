//! GraphQL codegen configuration with named overrides.
//!
//! Output keys under `generates` are file names, so they usually contain
//! dots. Every output-keyed override escapes the name before building the
//! path string:
//!
//! ```text
//! override_documents_for_output("src/gql.ts", ...)
//!     → generates.src/gql\.ts.documents
//! ```

use indexmap::IndexMap;
use tracing::instrument;

use crate::domain::document::{ConfigDocument, ConfigNode, Mapping};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::overrides::OverrideSet;
use crate::domain::path::{OverridePath, escape_segment};

const GENERATES: &str = "generates";

/// Path to `key` inside the `generates` entry for `output`.
pub fn output_path(output: &str, key: &str) -> DomainResult<OverridePath> {
    if output.trim().is_empty() {
        return Err(DomainError::InvalidOutput {
            output: output.to_string(),
            reason: "output name cannot be empty".into(),
        });
    }
    OverridePath::parse(&format!("{GENERATES}.{}.{key}", escape_segment(output)))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodegenConfigAssembler {
    base: ConfigDocument,
    overrides: OverrideSet,
}

impl CodegenConfigAssembler {
    pub fn new(base: ConfigDocument) -> Self {
        Self {
            base,
            overrides: OverrideSet::new(),
        }
    }

    pub fn from_config(config: &CodegenConfig) -> Self {
        Self::new(config.to_document())
    }

    pub fn base(&self) -> &ConfigDocument {
        &self.base
    }

    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    /// Generic override. `None` removes the key.
    pub fn add_override(&mut self, path: &str, value: Option<ConfigNode>) -> DomainResult<&mut Self> {
        self.overrides.add(path, value)?;
        Ok(self)
    }

    pub fn override_schema(&mut self, value: Option<ConfigNode>) -> &mut Self {
        self.record(OverridePath::key("schema"), value)
    }

    pub fn override_overwrite(&mut self, value: Option<bool>) -> &mut Self {
        self.record(OverridePath::key("overwrite"), value.map(ConfigNode::from))
    }

    pub fn override_documents_for_output(
        &mut self,
        output: &str,
        value: Option<ConfigNode>,
    ) -> DomainResult<&mut Self> {
        self.record_output(output, "documents", value)
    }

    pub fn override_plugins_for_output(
        &mut self,
        output: &str,
        value: Option<ConfigNode>,
    ) -> DomainResult<&mut Self> {
        self.record_output(output, "plugins", value)
    }

    pub fn override_config_for_output(
        &mut self,
        output: &str,
        value: Option<ConfigNode>,
    ) -> DomainResult<&mut Self> {
        self.record_output(output, "config", value)
    }

    pub fn override_preset_for_output(
        &mut self,
        output: &str,
        value: Option<ConfigNode>,
    ) -> DomainResult<&mut Self> {
        self.record_output(output, "preset", value)
    }

    pub fn override_preset_config_for_output(
        &mut self,
        output: &str,
        value: Option<ConfigNode>,
    ) -> DomainResult<&mut Self> {
        self.record_output(output, "presetConfig", value)
    }

    fn record_output(
        &mut self,
        output: &str,
        key: &str,
        value: Option<ConfigNode>,
    ) -> DomainResult<&mut Self> {
        let path = output_path(output, key)?;
        Ok(self.record(path, value))
    }

    fn record(&mut self, path: OverridePath, value: Option<ConfigNode>) -> &mut Self {
        match value {
            Some(value) => self.overrides.set(path, value),
            None => self.overrides.delete(path),
        };
        self
    }

    /// Apply the recorded overrides to a copy of the base document.
    #[instrument(skip(self), fields(overrides = self.overrides.len()))]
    pub fn synthesize(&self) -> DomainResult<ConfigDocument> {
        self.overrides.apply_to(self.base.clone())
    }
}

// ── Typed base config ────────────────────────────────────────────────────────

/// One entry of `generates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodegenOutput {
    pub preset: Option<String>,
    pub preset_config: Mapping,
    pub documents: Option<ConfigNode>,
    pub plugins: Vec<String>,
    pub config: Mapping,
}

impl CodegenOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn preset_config(mut self, key: impl Into<String>, value: impl Into<ConfigNode>) -> Self {
        self.preset_config.insert(key.into(), value.into());
        self
    }

    pub fn documents(mut self, documents: impl Into<ConfigNode>) -> Self {
        self.documents = Some(documents.into());
        self
    }

    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugins.push(plugin.into());
        self
    }

    pub fn config(mut self, key: impl Into<String>, value: impl Into<ConfigNode>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    fn to_node(&self) -> ConfigNode {
        let mut map = Mapping::new();
        if let Some(preset) = &self.preset {
            map.insert("preset".into(), preset.as_str().into());
        }
        if !self.preset_config.is_empty() {
            map.insert(
                "presetConfig".into(),
                ConfigNode::Mapping(self.preset_config.clone()),
            );
        }
        if let Some(documents) = &self.documents {
            map.insert("documents".into(), documents.clone());
        }
        if !self.plugins.is_empty() {
            map.insert(
                "plugins".into(),
                ConfigNode::Sequence(self.plugins.iter().map(|p| p.as_str().into()).collect()),
            );
        }
        if !self.config.is_empty() {
            map.insert("config".into(), ConfigNode::Mapping(self.config.clone()));
        }
        ConfigNode::Mapping(map)
    }
}

/// Base codegen document.
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenConfig {
    pub overwrite: bool,
    pub schema: ConfigNode,
    pub documents: Option<ConfigNode>,
    pub generates: IndexMap<String, CodegenOutput>,
}

impl CodegenConfig {
    pub fn new(schema: impl Into<ConfigNode>) -> Self {
        Self {
            overwrite: true,
            schema: schema.into(),
            documents: None,
            generates: IndexMap::new(),
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn documents(mut self, documents: impl Into<ConfigNode>) -> Self {
        self.documents = Some(documents.into());
        self
    }

    pub fn output(mut self, name: impl Into<String>, output: CodegenOutput) -> Self {
        self.generates.insert(name.into(), output);
        self
    }

    pub fn to_document(&self) -> ConfigDocument {
        let mut doc = ConfigDocument::new()
            .with("overwrite", self.overwrite)
            .with("schema", self.schema.clone());
        if let Some(documents) = &self.documents {
            doc.insert("documents", documents.clone());
        }
        let generates: Mapping = self
            .generates
            .iter()
            .map(|(name, output)| (name.clone(), output.to_node()))
            .collect();
        doc.insert(GENERATES, generates);
        doc
    }
}
