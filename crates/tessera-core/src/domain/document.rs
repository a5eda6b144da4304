//! Configuration document model.
//!
//! Every generated artifact (lint config, workflow file, codegen spec) is an
//! in-memory tree of [`ConfigNode`]s before it is serialized. The tree is a
//! closed tagged variant so merge and override logic dispatch on an explicit
//! tag rather than on the shape of a value.
//!
//! ```text
//! ConfigDocument
//! └── Mapping (IndexMap<String, ConfigNode>, insertion ordered)
//!      ├── Scalar   (null | bool | number | string)
//!      ├── Sequence (Vec<ConfigNode>)
//!      └── Mapping  (recursive)
//! ```
//!
//! Key order is first-insertion order everywhere. Replacing a value keeps the
//! key in its original position, which is what makes merge output byte-for-
//! byte reproducible.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::domain::error::{DomainError, DomainResult};

/// Ordered key → node map used for every mapping in a document.
pub type Mapping = IndexMap<String, ConfigNode>;

// ── Scalar ───────────────────────────────────────────────────────────────────

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// JavaScript truthiness: `null`, `false`, `0` and `""` are falsy.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
            Self::String(s) => s.is_empty(),
        }
    }
}

// ── ConfigNode ───────────────────────────────────────────────────────────────

/// One node of a configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Scalar(Scalar),
    Sequence(Vec<ConfigNode>),
    Mapping(Mapping),
}

impl ConfigNode {
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    pub fn empty_mapping() -> Self {
        Self::Mapping(Mapping::new())
    }

    /// Short name of the variant, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Scalars follow [`Scalar::is_falsy`]; sequences and mappings are
    /// always truthy, even when empty.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_falsy(),
            Self::Sequence(_) | Self::Mapping(_) => false,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigNode]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Convert into a `serde_json::Value`, preserving key order.
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Scalar(Scalar::Null),
            Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Self::Scalar(Scalar::Number(n)),
            Value::String(s) => Self::Scalar(Scalar::String(s)),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<ConfigNode> for Value {
    fn from(node: ConfigNode) -> Self {
        match node {
            ConfigNode::Scalar(Scalar::Null) => Value::Null,
            ConfigNode::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            ConfigNode::Scalar(Scalar::Number(n)) => Value::Number(n),
            ConfigNode::Scalar(Scalar::String(s)) => Value::String(s),
            ConfigNode::Sequence(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ConfigNode::Mapping(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for ConfigNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<&str> for ConfigNode {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for ConfigNode {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::String(s))
    }
}

impl From<bool> for ConfigNode {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for ConfigNode {
    fn from(n: i64) -> Self {
        Self::Scalar(Scalar::Number(Number::from(n)))
    }
}

impl From<u64> for ConfigNode {
    fn from(n: u64) -> Self {
        Self::Scalar(Scalar::Number(Number::from(n)))
    }
}

impl From<Mapping> for ConfigNode {
    fn from(map: Mapping) -> Self {
        Self::Mapping(map)
    }
}

impl<T: Into<ConfigNode>> From<Vec<T>> for ConfigNode {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

// ── ConfigDocument ───────────────────────────────────────────────────────────

/// The pre-serialization form of one generated artifact.
///
/// The root is always a mapping. A fresh document is created per template
/// invocation and is never cached between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    root: Mapping,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    pub fn into_mapping(self) -> Mapping {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.root.get(key)
    }

    /// Follow raw segments from the root through nested mappings.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<&ConfigNode> {
        let (first, rest) = segments.split_first()?;
        let mut node = self.root.get(first.as_ref())?;
        for segment in rest {
            node = node.get(segment.as_ref())?;
        }
        Some(node)
    }

    /// Insert (or replace in place) a top-level key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigNode>) {
        self.root.insert(key.into(), value.into());
    }

    /// Fluent variant of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigNode>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.root
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl TryFrom<Value> for ConfigDocument {
    type Error = DomainError;

    fn try_from(value: Value) -> DomainResult<Self> {
        match ConfigNode::from(value) {
            ConfigNode::Mapping(root) => Ok(Self { root }),
            other => Err(DomainError::InvalidDocument(format!(
                "document root must be a mapping, found {}",
                other.kind()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl From<Mapping> for ConfigDocument {
    fn from(root: Mapping) -> Self {
        Self { root }
    }
}

// ── Fragment ─────────────────────────────────────────────────────────────────

/// A named partial document contributed by one concern
/// ("quality rules", "react rules", ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    name: String,
    document: ConfigDocument,
}

impl Fragment {
    /// Create a fragment.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty. Fragment names are chosen by template
    /// authors; use [`try_new`](Self::try_new) for names from user input.
    pub fn new(name: impl Into<String>, document: ConfigDocument) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "Fragment name cannot be empty");
        Self { name, document }
    }

    pub fn try_new(name: impl Into<String>, document: ConfigDocument) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidFragment {
                name,
                reason: "name cannot be empty".into(),
            });
        }
        Ok(Self { name, document })
    }

    /// Build a fragment from a JSON value whose root is an object.
    pub fn from_json(name: impl Into<String>, value: Value) -> DomainResult<Self> {
        let name = name.into();
        let document = ConfigDocument::try_from(value).map_err(|e| DomainError::InvalidFragment {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Self::try_new(name, document)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn into_document(self) -> ConfigDocument {
        self.document
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} keys)", self.name, self.document.len())
    }
}
