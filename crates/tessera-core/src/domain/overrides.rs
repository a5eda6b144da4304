//! Point mutations on a [`ConfigDocument`].
//!
//! An override either sets a value at a path (creating intermediate mappings
//! on the way down) or deletes the key at that path. Sequences are opaque
//! leaves: a path never indexes into one.

use tracing::debug;

use crate::domain::document::{ConfigDocument, ConfigNode, Mapping};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::path::OverridePath;

/// Apply a single set (`Some`) or delete (`None`) at `path`.
///
/// Setting autovivifies missing intermediates and replaces any intermediate
/// that is not a mapping. Deleting a key whose parent is missing, or whose
/// parent is not a mapping, leaves the document untouched.
pub fn apply_override(doc: &mut ConfigDocument, path: &OverridePath, value: Option<ConfigNode>) {
    let (parents, leaf) = path.split_last();
    match value {
        Some(value) => {
            debug!(path = %path, "set override");
            let parent = descend_creating(doc.root_mut(), parents);
            parent.insert(leaf.to_string(), value);
        }
        None => {
            debug!(path = %path, "delete override");
            if let Some(parent) = descend_existing(doc.root_mut(), parents) {
                parent.shift_remove(leaf);
            }
        }
    }
}

/// Append `values` to the sequence at `path`, creating it when absent.
pub fn append_override(
    doc: &mut ConfigDocument,
    path: &OverridePath,
    values: Vec<ConfigNode>,
) -> DomainResult<()> {
    let (parents, leaf) = path.split_last();
    let parent = descend_creating(doc.root_mut(), parents);

    match parent.get_mut(leaf) {
        Some(ConfigNode::Sequence(items)) => {
            items.extend(values);
            Ok(())
        }
        Some(other) => Err(DomainError::TypeConflict {
            path: path.to_string(),
            fragment: "override".into(),
            expected: "sequence",
            found: other.kind(),
        }),
        None => {
            parent.insert(leaf.to_string(), ConfigNode::Sequence(values));
            Ok(())
        }
    }
}

fn descend_creating<'a>(mut map: &'a mut Mapping, segments: &[String]) -> &'a mut Mapping {
    for segment in segments {
        let slot = map
            .entry(segment.clone())
            .or_insert_with(ConfigNode::empty_mapping);
        map = ensure_mapping(slot);
    }
    map
}

fn descend_existing<'a>(mut map: &'a mut Mapping, segments: &[String]) -> Option<&'a mut Mapping> {
    for segment in segments {
        map = map.get_mut(segment.as_str())?.as_mapping_mut()?;
    }
    Some(map)
}

/// Coerce a node into a mapping in place, discarding a non-mapping value.
fn ensure_mapping(node: &mut ConfigNode) -> &mut Mapping {
    if !matches!(node, ConfigNode::Mapping(_)) {
        *node = ConfigNode::empty_mapping();
    }
    match node {
        ConfigNode::Mapping(map) => map,
        _ => unreachable!("node was just replaced by a mapping"),
    }
}

// ── Recorded overrides ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum OverrideOp {
    Set(ConfigNode),
    Delete,
    Append(Vec<ConfigNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: OverridePath,
    pub op: OverrideOp,
}

impl Override {
    pub fn apply(&self, doc: &mut ConfigDocument) -> DomainResult<()> {
        match &self.op {
            OverrideOp::Set(value) => apply_override(doc, &self.path, Some(value.clone())),
            OverrideOp::Delete => apply_override(doc, &self.path, None),
            OverrideOp::Append(values) => append_override(doc, &self.path, values.clone())?,
        }
        Ok(())
    }
}

/// Ordered overrides, parsed when recorded and applied in recorded order.
///
/// # Example
///
/// ```rust
/// use tessera_core::domain::{ConfigDocument, OverrideSet};
///
/// let mut overrides = OverrideSet::new();
/// overrides
///     .add("generates.out\\.ts.documents", Some("src/**/*.ts".into()))?
///     .add("overwrite", None)?;
///
/// let doc = overrides.apply_to(ConfigDocument::new().with("overwrite", true))?;
/// assert!(doc.get("overwrite").is_none());
/// assert!(doc.lookup(&["generates", "out.ts", "documents"]).is_some());
/// # Ok::<(), tessera_core::domain::DomainError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSet {
    entries: Vec<Override>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a set (`Some`) or delete (`None`) from a path string.
    pub fn add(&mut self, path: &str, value: Option<ConfigNode>) -> DomainResult<&mut Self> {
        let path = OverridePath::parse(path)?;
        Ok(self.push(path, value.map_or(OverrideOp::Delete, OverrideOp::Set)))
    }

    pub fn set(&mut self, path: OverridePath, value: impl Into<ConfigNode>) -> &mut Self {
        self.push(path, OverrideOp::Set(value.into()))
    }

    pub fn delete(&mut self, path: OverridePath) -> &mut Self {
        self.push(path, OverrideOp::Delete)
    }

    pub fn append(&mut self, path: OverridePath, values: Vec<ConfigNode>) -> &mut Self {
        self.push(path, OverrideOp::Append(values))
    }

    fn push(&mut self, path: OverridePath, op: OverrideOp) -> &mut Self {
        self.entries.push(Override { path, op });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Override> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every recorded override to `doc` in order.
    pub fn apply(&self, doc: &mut ConfigDocument) -> DomainResult<()> {
        for entry in &self.entries {
            entry.apply(doc)?;
        }
        Ok(())
    }

    /// Consuming variant of [`apply`](Self::apply).
    pub fn apply_to(&self, mut doc: ConfigDocument) -> DomainResult<ConfigDocument> {
        self.apply(&mut doc)?;
        Ok(doc)
    }
}
