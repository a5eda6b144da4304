//! Lint configuration assembly.
//!
//! The two base fragments split rule ownership: `quality` carries
//! static-analysis rules, `formatting` carries whitespace and ordering
//! rules. They must never define the same rule. Framework fragments
//! (react, jest, ...) are merged after them.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::domain::document::{ConfigDocument, ConfigNode, Fragment};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::merge::{MergePolicy, ShapeMismatch, merge};
use crate::domain::overrides::OverrideSet;

/// Keys whose sequences concatenate across lint fragments.
pub static LINT_ARRAY_PROPERTIES: &[&str] = &["extends", "overrides", "plugins"];

pub fn lint_merge_policy() -> MergePolicy {
    LINT_ARRAY_PROPERTIES
        .iter()
        .fold(MergePolicy::new(), |policy, key| policy.concat(key))
}

#[derive(Debug, Clone)]
pub struct LintConfigAssembler {
    quality: Fragment,
    formatting: Fragment,
    extra: Vec<Fragment>,
    inherit_base: bool,
    policy: MergePolicy,
    overrides: OverrideSet,
}

impl LintConfigAssembler {
    pub fn new(quality: Fragment, formatting: Fragment) -> Self {
        Self {
            quality,
            formatting,
            extra: Vec::new(),
            inherit_base: false,
            policy: lint_merge_policy(),
            overrides: OverrideSet::new(),
        }
    }

    pub fn with_fragment(mut self, fragment: Fragment) -> Self {
        self.extra.push(fragment);
        self
    }

    pub fn add_fragment(&mut self, fragment: Fragment) -> &mut Self {
        self.extra.push(fragment);
        self
    }

    /// When a parent project already carries the base fragments, only the
    /// framework fragments are merged.
    pub fn inherit_base(mut self, inherit: bool) -> Self {
        self.inherit_base = inherit;
        self
    }

    pub fn on_shape_mismatch(mut self, policy: ShapeMismatch) -> Self {
        self.policy = self.policy.on_shape_mismatch(policy);
        self
    }

    /// Record a point override applied after merging.
    pub fn add_override(&mut self, path: &str, value: Option<ConfigNode>) -> DomainResult<&mut Self> {
        self.overrides.add(path, value)?;
        Ok(self)
    }

    /// Fragments in merge order.
    pub fn fragments(&self) -> Vec<&Fragment> {
        let base = (!self.inherit_base).then_some([&self.quality, &self.formatting]);
        base.into_iter()
            .flatten()
            .chain(self.extra.iter())
            .collect()
    }

    /// Check that no rule is owned by both base fragments.
    pub fn validate(&self) -> DomainResult<()> {
        let formatting: HashSet<&str> = rule_names(&self.formatting).collect();
        match rule_names(&self.quality).find(|rule| formatting.contains(rule)) {
            Some(rule) => Err(DomainError::RuleOwnershipConflict {
                rule: rule.to_string(),
                first: self.quality.name().to_string(),
                second: self.formatting.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    #[instrument(skip(self), fields(inherit_base = self.inherit_base, extra = self.extra.len()))]
    pub fn assemble(&self) -> DomainResult<ConfigDocument> {
        if !self.inherit_base {
            self.validate()?;
        }

        let fragments: Vec<Fragment> = self.fragments().into_iter().cloned().collect();
        let merged = merge(&fragments, &self.policy)?;
        debug!(keys = merged.len(), "lint config merged");

        self.overrides.apply_to(merged)
    }
}

fn rule_names(fragment: &Fragment) -> impl Iterator<Item = &str> {
    fragment
        .document()
        .get("rules")
        .and_then(ConfigNode::as_mapping)
        .into_iter()
        .flat_map(|rules| rules.keys().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quality() -> Fragment {
        Fragment::from_json(
            "quality",
            json!({"rules": {"curly": ["error"]}, "extends": ["plugin:import/typescript"]}),
        )
        .unwrap()
    }

    fn formatting() -> Fragment {
        Fragment::from_json(
            "formatting",
            json!({"rules": {"padding-line-between-statements": ["error"]}, "extends": []}),
        )
        .unwrap()
    }

    fn react() -> Fragment {
        Fragment::from_json(
            "react",
            json!({"extends": ["plugin:react/recommended"], "plugins": ["react"]}),
        )
        .unwrap()
    }

    #[test]
    fn policy_concatenates_lint_array_properties() {
        let policy = lint_merge_policy();
        for key in LINT_ARRAY_PROPERTIES {
            assert!(policy.is_concat(&[key.to_string()]));
        }
        assert!(!policy.is_concat(&["rules".to_string()]));
    }

    #[test]
    fn assembles_base_and_framework_fragments() {
        let doc = LintConfigAssembler::new(quality(), formatting())
            .with_fragment(react())
            .assemble()
            .unwrap();

        assert_eq!(
            doc.get("extends").unwrap().to_json(),
            json!(["plugin:import/typescript", "plugin:react/recommended"])
        );
        assert_eq!(
            doc.get("rules").unwrap().to_json(),
            json!({"curly": ["error"], "padding-line-between-statements": ["error"]})
        );
        assert_eq!(doc.get("plugins").unwrap().to_json(), json!(["react"]));
    }

    #[test]
    fn inherit_base_skips_base_fragments() {
        let assembler = LintConfigAssembler::new(quality(), formatting())
            .with_fragment(react())
            .inherit_base(true);

        assert_eq!(assembler.fragments().len(), 1);
        let doc = assembler.assemble().unwrap();
        assert!(doc.get("rules").is_none());
        assert_eq!(
            doc.get("extends").unwrap().to_json(),
            json!(["plugin:react/recommended"])
        );
    }

    #[test]
    fn overlapping_rule_ownership_is_rejected() {
        let formatting =
            Fragment::from_json("formatting", json!({"rules": {"curly": "off"}})).unwrap();
        let err = LintConfigAssembler::new(quality(), formatting)
            .assemble()
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::RuleOwnershipConflict {
                rule: "curly".into(),
                first: "quality".into(),
                second: "formatting".into(),
            }
        );
    }

    #[test]
    fn overrides_apply_after_merge() {
        let mut assembler = LintConfigAssembler::new(quality(), formatting());
        assembler
            .add_override("rules.curly", None)
            .unwrap()
            .add_override("root", Some(true.into()))
            .unwrap();

        let doc = assembler.assemble().unwrap();
        assert!(doc.lookup(&["rules", "curly"]).is_none());
        assert_eq!(doc.get("root").and_then(ConfigNode::as_bool), Some(true));
    }

    #[test]
    fn no_fragments_produce_empty_document() {
        let doc = LintConfigAssembler::new(quality(), formatting())
            .inherit_base(true)
            .assemble()
            .unwrap();
        assert!(doc.is_empty());
    }
}
