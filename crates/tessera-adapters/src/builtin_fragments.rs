//! Built-in fragments and user fragment discovery.
//!
//! [`all_fragments`] returns the fragments that ship with tessera. They are
//! always available under fixed names:
//!
//! | Name              | Concern                                   |
//! |-------------------|-------------------------------------------|
//! | `lint/quality`    | static-analysis rules, never formatting   |
//! | `lint/formatting` | whitespace and ordering rules only        |
//! | `lint/typescript` | TypeScript parser and plugin              |
//! | `lint/react`      | React plugin, recommended rules           |
//! | `lint/jest`       | Jest plugin for test files                |
//!
//! [`discover_user_fragments`] looks for a user fragments directory, probing
//! in this priority order and stopping at the first directory that yields at
//! least one fragment:
//!
//! 1. **`$TESSERA_FRAGMENTS_DIR`**: environment variable override.
//! 2. **`./fragments`**: relative to the current working directory.
//! 3. **`<executable-dir>/fragments`**: sibling to the `tessera` binary.
//! 4. **`../fragments`**: one level above CWD, for development runs.

use std::path::PathBuf;

use serde_json::json;
use tracing::{debug, info, instrument};

use tessera_core::{
    domain::{DomainResult, Fragment},
    error::TesseraResult,
};

use crate::fragment_loader::FilesystemFragmentLoader;

/// Environment variable naming a user fragments directory.
pub const FRAGMENTS_DIR_ENV: &str = "TESSERA_FRAGMENTS_DIR";

// ── Built-in fragments ────────────────────────────────────────────────────────

/// Every built-in fragment, sorted by name.
pub fn all_fragments() -> DomainResult<Vec<Fragment>> {
    Ok(vec![
        lint_formatting()?,
        lint_jest()?,
        lint_quality()?,
        lint_react()?,
        lint_typescript()?,
    ])
}

/// Static-analysis rules. Must not own any formatting rule.
pub fn lint_quality() -> DomainResult<Fragment> {
    Fragment::from_json(
        "lint/quality",
        json!({
            "root": true,
            "env": {"es2022": true, "node": true},
            "extends": ["eslint:recommended", "plugin:import/recommended"],
            "plugins": ["import"],
            "rules": {
                "curly": ["error", "all"],
                "eqeqeq": ["error", "always"],
                "no-console": ["warn", {"allow": ["warn", "error"]}],
                "no-var": "error",
                "prefer-const": "error",
                "import/no-cycle": "error",
                "import/no-duplicates": "error"
            }
        }),
    )
}

/// Whitespace and ordering rules. Must not own any semantic rule.
pub fn lint_formatting() -> DomainResult<Fragment> {
    Fragment::from_json(
        "lint/formatting",
        json!({
            "extends": [],
            "rules": {
                "padding-line-between-statements": [
                    "error",
                    {"blankLine": "always", "prev": "*", "next": "return"}
                ],
                "import/order": [
                    "error",
                    {"newlines-between": "always", "alphabetize": {"order": "asc"}}
                ],
                "sort-imports": ["error", {"ignoreDeclarationSort": true}]
            }
        }),
    )
}

pub fn lint_typescript() -> DomainResult<Fragment> {
    Fragment::from_json(
        "lint/typescript",
        json!({
            "parser": "@typescript-eslint/parser",
            "extends": ["plugin:@typescript-eslint/recommended", "plugin:import/typescript"],
            "plugins": ["@typescript-eslint"],
            "rules": {
                "@typescript-eslint/no-explicit-any": "error"
            }
        }),
    )
}

pub fn lint_react() -> DomainResult<Fragment> {
    Fragment::from_json(
        "lint/react",
        json!({
            "extends": ["plugin:react/recommended", "plugin:react-hooks/recommended"],
            "plugins": ["react"],
            "settings": {"react": {"version": "detect"}},
            "rules": {
                "react/react-in-jsx-scope": "off"
            }
        }),
    )
}

pub fn lint_jest() -> DomainResult<Fragment> {
    Fragment::from_json(
        "lint/jest",
        json!({
            "overrides": [{
                "files": ["**/*.test.*", "**/*.spec.*"],
                "env": {"jest": true},
                "extends": ["plugin:jest/recommended"]
            }],
            "plugins": ["jest"]
        }),
    )
}

// ── User fragment discovery ───────────────────────────────────────────────────

/// Load fragments from the first user directory that has any.
///
/// Returns an empty `Vec` when no candidate directory exists. Individual
/// files that fail to parse are skipped by the loader.
#[instrument]
pub fn discover_user_fragments() -> TesseraResult<Vec<Fragment>> {
    for candidate in candidate_paths() {
        debug!(path = %candidate.display(), "checking candidate fragments path");

        if !candidate.is_dir() {
            debug!(path = %candidate.display(), "path does not exist, skipping");
            continue;
        }

        let fragments = FilesystemFragmentLoader::new(&candidate).load_all()?;
        if fragments.is_empty() {
            debug!(
                path = %candidate.display(),
                "directory exists but contains no fragments, trying next"
            );
            continue;
        }

        info!(
            path  = %candidate.display(),
            count = fragments.len(),
            "user fragments loaded"
        );
        return Ok(fragments);
    }

    debug!("no user fragments directory found");
    Ok(vec![])
}

/// Ordered list of candidate directories to probe.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(4);

    if let Ok(env_dir) = std::env::var(FRAGMENTS_DIR_ENV) {
        let p = PathBuf::from(env_dir);
        debug!(path = %p.display(), "candidate from $TESSERA_FRAGMENTS_DIR");
        paths.push(p);
    }

    paths.push(PathBuf::from("fragments"));

    if let Some(exe_sibling) = exe_sibling_fragments() {
        debug!(path = %exe_sibling.display(), "candidate from exe sibling");
        paths.push(exe_sibling);
    }

    paths.push(PathBuf::from("../fragments"));

    paths
}

fn exe_sibling_fragments() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("fragments")))
}
