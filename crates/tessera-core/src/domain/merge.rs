//! Deep merge of ordered fragments.
//!
//! Rules, applied key by key from the first fragment to the last:
//!
//! - mapping + mapping: merged recursively
//! - designated concat path: sequences are concatenated in fragment order,
//!   falsy items dropped
//! - anything else: the later fragment replaces the earlier value
//!
//! A replaced key keeps the position it was first inserted at.

use tracing::debug;

use crate::domain::document::{ConfigDocument, ConfigNode, Fragment, Mapping};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::path::OverridePath;

/// What to do when a concat path holds something other than a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShapeMismatch {
    /// Fail with [`DomainError::TypeConflict`].
    #[default]
    Reject,
    /// Treat the value as a one-element sequence. Falsy values contribute nothing.
    Wrap,
}

/// Caller-supplied merge configuration.
///
/// Concat paths are full paths from the document root: `extends` names the
/// top-level key, `jobs.build.steps` a nested one. Sequences anywhere else
/// follow later-wins replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePolicy {
    concat: Vec<OverridePath>,
    shape_mismatch: ShapeMismatch,
}

impl MergePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate the top-level `key`.
    pub fn concat(self, key: &str) -> Self {
        self.concat_path(OverridePath::key(key))
    }

    pub fn concat_path(mut self, path: OverridePath) -> Self {
        if !self.concat.contains(&path) {
            self.concat.push(path);
        }
        self
    }

    pub fn on_shape_mismatch(mut self, policy: ShapeMismatch) -> Self {
        self.shape_mismatch = policy;
        self
    }

    pub fn is_concat(&self, segments: &[String]) -> bool {
        self.concat.iter().any(|p| p.segments() == segments)
    }

    pub fn concat_paths(&self) -> &[OverridePath] {
        &self.concat
    }

    pub fn shape_mismatch(&self) -> ShapeMismatch {
        self.shape_mismatch
    }
}

/// Merge fragments in order. Zero fragments yield an empty document.
pub fn merge(fragments: &[Fragment], policy: &MergePolicy) -> DomainResult<ConfigDocument> {
    debug!(
        fragments = fragments.len(),
        concat = policy.concat.len(),
        "merging fragments"
    );
    let mut root = Mapping::new();
    for fragment in fragments {
        merge_one(&mut root, fragment.document(), fragment.name(), policy)?;
    }
    Ok(ConfigDocument::from_mapping(root))
}

/// Merge unnamed documents; errors label them `#0`, `#1`, ...
pub fn merge_documents<'a, I>(documents: I, policy: &MergePolicy) -> DomainResult<ConfigDocument>
where
    I: IntoIterator<Item = &'a ConfigDocument>,
{
    let mut root = Mapping::new();
    for (index, document) in documents.into_iter().enumerate() {
        merge_one(&mut root, document, &format!("#{index}"), policy)?;
    }
    Ok(ConfigDocument::from_mapping(root))
}

fn merge_one(
    root: &mut Mapping,
    source: &ConfigDocument,
    origin: &str,
    policy: &MergePolicy,
) -> DomainResult<()> {
    let ctx = MergeContext { policy, origin };
    merge_mapping(root, source.root(), &mut Vec::new(), &ctx)
}

struct MergeContext<'a> {
    policy: &'a MergePolicy,
    origin: &'a str,
}

fn merge_mapping(
    target: &mut Mapping,
    source: &Mapping,
    path: &mut Vec<String>,
    ctx: &MergeContext<'_>,
) -> DomainResult<()> {
    for (key, incoming) in source {
        path.push(key.clone());
        let inserted = match target.get_mut(key.as_str()) {
            Some(existing) => {
                merge_node(existing, incoming, path, ctx)?;
                None
            }
            None => Some(fresh_node(incoming, path, ctx)?),
        };
        if let Some(node) = inserted {
            target.insert(key.clone(), node);
        }
        path.pop();
    }
    Ok(())
}

fn merge_node(
    existing: &mut ConfigNode,
    incoming: &ConfigNode,
    path: &mut Vec<String>,
    ctx: &MergeContext<'_>,
) -> DomainResult<()> {
    if ctx.policy.is_concat(path) {
        let items = concat_items(incoming, path, ctx)?;
        match existing {
            ConfigNode::Sequence(current) => current.extend(items),
            other => *other = ConfigNode::Sequence(items),
        }
        return Ok(());
    }

    match (existing, incoming) {
        (ConfigNode::Mapping(current), ConfigNode::Mapping(next)) => {
            merge_mapping(current, next, path, ctx)
        }
        (slot, next) => {
            *slot = fresh_node(next, path, ctx)?;
            Ok(())
        }
    }
}

/// Copy a node into the result. Mappings are walked so nested concat paths
/// are filtered even on first sight.
fn fresh_node(
    incoming: &ConfigNode,
    path: &mut Vec<String>,
    ctx: &MergeContext<'_>,
) -> DomainResult<ConfigNode> {
    if ctx.policy.is_concat(path) {
        return concat_items(incoming, path, ctx).map(ConfigNode::Sequence);
    }
    match incoming {
        ConfigNode::Mapping(next) => {
            let mut fresh = Mapping::new();
            merge_mapping(&mut fresh, next, path, ctx)?;
            Ok(ConfigNode::Mapping(fresh))
        }
        other => Ok(other.clone()),
    }
}

fn concat_items(
    incoming: &ConfigNode,
    path: &[String],
    ctx: &MergeContext<'_>,
) -> DomainResult<Vec<ConfigNode>> {
    match incoming {
        ConfigNode::Sequence(items) => Ok(items.iter().filter(|i| !i.is_falsy()).cloned().collect()),
        other => match ctx.policy.shape_mismatch {
            ShapeMismatch::Reject => Err(DomainError::TypeConflict {
                path: OverridePath::from_trusted(path.to_vec()).to_string(),
                fragment: ctx.origin.to_string(),
                expected: "sequence",
                found: other.kind(),
            }),
            ShapeMismatch::Wrap if other.is_falsy() => Ok(Vec::new()),
            ShapeMismatch::Wrap => Ok(vec![other.clone()]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn frag(name: &str, value: Value) -> Fragment {
        Fragment::from_json(name, value).unwrap()
    }

    fn lint_policy() -> MergePolicy {
        MergePolicy::new()
            .concat("extends")
            .concat("overrides")
            .concat("plugins")
    }

    #[test]
    fn zero_fragments_yield_empty_document() {
        let merged = merge(&[], &lint_policy()).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn single_fragment_is_copied() {
        let only = frag("only", json!({"a": {"b": [1, 2]}, "c": "x"}));
        let merged = merge(std::slice::from_ref(&only), &MergePolicy::new()).unwrap();
        assert_eq!(&merged, only.document());
    }

    #[test]
    fn later_scalar_wins() {
        let merged = merge(
            &[
                frag("a", json!({"overwrite": true})),
                frag("b", json!({"overwrite": false})),
            ],
            &MergePolicy::new(),
        )
        .unwrap();
        assert_eq!(merged.to_json(), json!({"overwrite": false}));
    }

    #[test]
    fn later_value_replaces_across_shapes() {
        let merged = merge(
            &[
                frag("a", json!({"x": {"nested": 1}, "y": "s", "z": [1]})),
                frag("b", json!({"x": "flat", "y": {"nested": 2}, "z": [2]})),
            ],
            &MergePolicy::new(),
        )
        .unwrap();
        assert_eq!(
            merged.to_json(),
            json!({"x": "flat", "y": {"nested": 2}, "z": [2]})
        );
    }

    #[test]
    fn mappings_merge_recursively() {
        let merged = merge(
            &[
                frag("a", json!({"rules": {"curly": ["error"], "eqeqeq": "warn"}})),
                frag("b", json!({"rules": {"eqeqeq": "error", "semi": "off"}})),
            ],
            &MergePolicy::new(),
        )
        .unwrap();
        assert_eq!(
            merged.to_json(),
            json!({"rules": {"curly": ["error"], "eqeqeq": "error", "semi": "off"}})
        );
    }

    #[test]
    fn concat_paths_concatenate_and_drop_falsy() {
        let merged = merge(
            &[
                frag("a", json!({"extends": ["a", "", null]})),
                frag("b", json!({"extends": []})),
                frag("c", json!({"extends": ["b", false, 0, "c"]})),
            ],
            &lint_policy(),
        )
        .unwrap();
        assert_eq!(merged.to_json(), json!({"extends": ["a", "b", "c"]}));
    }

    #[test]
    fn concatenation_is_associative() {
        let a = frag("a", json!({"extends": ["a"]}));
        let b = frag("b", json!({"extends": ["b"]}));
        let c = frag("c", json!({"extends": ["c"]}));
        let policy = lint_policy();

        let all = merge(&[a.clone(), b.clone(), c.clone()], &policy).unwrap();
        let left = merge_documents(
            [&merge(&[a.clone(), b.clone()], &policy).unwrap(), c.document()],
            &policy,
        )
        .unwrap();
        let right = merge_documents(
            [a.document(), &merge(&[b, c], &policy).unwrap()],
            &policy,
        )
        .unwrap();

        assert_eq!(all.to_json(), json!({"extends": ["a", "b", "c"]}));
        assert_eq!(all, left);
        assert_eq!(all, right);
    }

    #[test]
    fn undesignated_sequences_are_replaced() {
        let merged = merge(
            &[
                frag("a", json!({"ignorePatterns": ["dist"]})),
                frag("b", json!({"ignorePatterns": ["lib"]})),
            ],
            &lint_policy(),
        )
        .unwrap();
        assert_eq!(merged.to_json(), json!({"ignorePatterns": ["lib"]}));
    }

    #[test]
    fn concat_applies_only_at_full_path() {
        let merged = merge(
            &[
                frag("a", json!({"overrides": [{"files": ["*.ts"], "plugins": ["x"]}]})),
                frag("b", json!({"nested": {"plugins": ["a"]}})),
                frag("c", json!({"nested": {"plugins": ["b"]}})),
            ],
            &lint_policy(),
        )
        .unwrap();
        assert_eq!(merged.get("nested").unwrap().to_json(), json!({"plugins": ["b"]}));
    }

    #[test]
    fn nested_concat_path() {
        let policy = MergePolicy::new()
            .concat_path(OverridePath::parse("jobs.build.steps").unwrap());
        let merged = merge(
            &[
                frag("a", json!({"jobs": {"build": {"steps": ["checkout"], "runs-on": "x"}}})),
                frag("b", json!({"jobs": {"build": {"steps": ["", "test"]}}})),
            ],
            &policy,
        )
        .unwrap();
        assert_eq!(
            merged.to_json(),
            json!({"jobs": {"build": {"steps": ["checkout", "test"], "runs-on": "x"}}})
        );
    }

    #[test]
    fn first_sight_nested_concat_is_filtered() {
        let policy = MergePolicy::new()
            .concat_path(OverridePath::parse("a.list").unwrap());
        let merged = merge(&[frag("only", json!({"a": {"list": ["x", null]}}))], &policy).unwrap();
        assert_eq!(merged.to_json(), json!({"a": {"list": ["x"]}}));
    }

    #[test]
    fn shape_mismatch_rejects_by_default() {
        let err = merge(
            &[
                frag("quality", json!({"extends": ["a"]})),
                frag("react", json!({"extends": "plugin:react/recommended"})),
            ],
            &lint_policy(),
        )
        .unwrap_err();

        match err {
            DomainError::TypeConflict {
                path,
                fragment,
                expected,
                found,
            } => {
                assert_eq!(path, "extends");
                assert_eq!(fragment, "react");
                assert_eq!(expected, "sequence");
                assert_eq!(found, "scalar");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn shape_mismatch_wrap_coerces() {
        let policy = lint_policy().on_shape_mismatch(ShapeMismatch::Wrap);
        let merged = merge(
            &[
                frag("a", json!({"extends": "a"})),
                frag("b", json!({"extends": ["b"]})),
                frag("c", json!({"extends": ""})),
            ],
            &policy,
        )
        .unwrap();
        assert_eq!(merged.to_json(), json!({"extends": ["a", "b"]}));
    }

    #[test]
    fn key_order_is_first_insertion() {
        let merged = merge(
            &[
                frag("a", json!({"b": 1, "a": 1})),
                frag("b", json!({"c": 2, "b": 2})),
            ],
            &MergePolicy::new(),
        )
        .unwrap();
        let keys: Vec<_> = merged.root().keys().cloned().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn merge_is_deterministic() {
        let fragments = [
            frag("a", json!({"z": {"y": 1}, "extends": ["a"]})),
            frag("b", json!({"a": 2, "z": {"x": 3}, "extends": ["b"]})),
        ];
        let first = serde_json::to_string(&merge(&fragments, &lint_policy()).unwrap()).unwrap();
        let second = serde_json::to_string(&merge(&fragments, &lint_policy()).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
