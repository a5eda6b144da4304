//! Filesystem-based fragment loader.
//!
//! Discovers fragment documents in a directory tree and turns them into
//! named [`Fragment`]s. The fragment name is the file's path relative to the
//! root, without extension, using `/` as separator.
//!
//! # Directory layout expected
//!
//! ```text
//! fragments/
//! ├── lint/
//! │   ├── quality.json     → "lint/quality"
//! │   └── react.yaml       → "lint/react"
//! └── ci/
//!     └── node.toml        → "ci/node"
//! ```
//!
//! Files with other extensions are ignored. A file that cannot be read or
//! parsed is skipped with a warning so one bad fragment does not block the
//! rest.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use tessera_core::{
    application::ApplicationError,
    domain::{ArtifactFormat, ConfigDocument, DomainError, Fragment},
    error::{TesseraError, TesseraResult},
};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure to turn one file into a document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported file extension: {path} (expected json, yaml, yml or toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid {format} in {path}: {reason}")]
    Parse {
        path: PathBuf,
        format: ArtifactFormat,
        reason: String,
    },

    #[error("invalid document in {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: DomainError,
    },
}

impl LoadError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::UnsupportedFormat { path }
            | Self::Parse { path, .. }
            | Self::Document { path, .. } => path,
        }
    }
}

impl From<LoadError> for TesseraError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::Io { path, source } => ApplicationError::FilesystemError {
                path,
                reason: source.to_string(),
            }
            .into(),
            other => DomainError::InvalidFragment {
                name: other.path().display().to_string(),
                reason: other.to_string(),
            }
            .into(),
        }
    }
}

// ── Document parsing ──────────────────────────────────────────────────────────

/// Read a JSON, YAML or TOML file into a document. The format comes from
/// the extension.
pub fn read_document(path: &Path) -> Result<ConfigDocument, LoadError> {
    let format = ArtifactFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(path, format, &content)
}

/// Parse `content` in the given format. `origin` is only used in errors.
pub fn parse_document(
    origin: &Path,
    format: ArtifactFormat,
    content: &str,
) -> Result<ConfigDocument, LoadError> {
    let parse_error = |reason: String| LoadError::Parse {
        path: origin.to_path_buf(),
        format,
        reason,
    };

    let value: serde_json::Value = match format {
        ArtifactFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        ArtifactFormat::Yaml => {
            // An empty YAML file is an empty document, not null.
            if content.trim().is_empty() {
                return Ok(ConfigDocument::new());
            }
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
        }
        ArtifactFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
    };

    ConfigDocument::try_from(value).map_err(|source| LoadError::Document {
        path: origin.to_path_buf(),
        source,
    })
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads every fragment file below a root directory.
#[derive(Debug, Clone)]
pub struct FilesystemFragmentLoader {
    root: PathBuf,
}

impl FilesystemFragmentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load all fragments, sorted by name.
    ///
    /// Fails only when the root itself is missing or unreadable. Files that
    /// fail to parse are skipped with a `WARN` event.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn load_all(&self) -> TesseraResult<Vec<Fragment>> {
        if !self.root.is_dir() {
            return Err(ApplicationError::FilesystemError {
                path: self.root.clone(),
                reason: "fragments directory not found".into(),
            }
            .into());
        }

        let mut fragments = Vec::new();
        let mut seen = HashSet::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ApplicationError::FilesystemError {
                        path: self.root.clone(),
                        reason: e.to_string(),
                    }
                    .into());
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || ArtifactFormat::from_path(path).is_none() {
                continue;
            }

            let Some(name) = self.fragment_name(path) else {
                warn!(path = %path.display(), "cannot derive fragment name, skipping");
                continue;
            };

            if !seen.insert(name.clone()) {
                warn!(
                    name = %name,
                    path = %path.display(),
                    "duplicate fragment name, keeping the first file"
                );
                continue;
            }

            match self.load_file(&name, path) {
                Ok(fragment) => {
                    debug!(name = %fragment.name(), "loaded fragment");
                    fragments.push(fragment);
                }
                Err(e) => {
                    // One bad fragment must not block all others.
                    warn!(
                        path  = %path.display(),
                        error = %e,
                        "skipping fragment file due to load error"
                    );
                }
            }
        }

        fragments.sort_by(|a, b| a.name().cmp(b.name()));
        debug!(count = fragments.len(), "finished loading fragments");
        Ok(fragments)
    }

    fn load_file(&self, name: &str, path: &Path) -> TesseraResult<Fragment> {
        let document = read_document(path)?;
        Ok(Fragment::try_new(name, document)?)
    }

    fn fragment_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let segments: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        if segments.is_empty() {
            return None;
        }
        Some(segments.join("/"))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // ── helpers ───────────────────────────────────────────────────────────

    fn make_fragment_dir(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (rel_path, content) in files {
            let full = temp.path().join(rel_path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(full, content).unwrap();
        }
        temp
    }

    fn names(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(Fragment::name).collect()
    }

    // ── load_all ──────────────────────────────────────────────────────────

    #[test]
    fn load_all_returns_error_for_missing_dir() {
        let loader = FilesystemFragmentLoader::new("/absolutely/does/not/exist");
        assert!(matches!(
            loader.load_all(),
            Err(TesseraError::Application(ApplicationError::FilesystemError { .. }))
        ));
    }

    #[test]
    fn names_come_from_relative_paths() {
        let temp = make_fragment_dir(&[
            ("lint/quality.json", r#"{"rules": {"curly": ["error"]}}"#),
            ("lint/react.yaml", "extends:\n  - plugin:react/recommended\n"),
            ("ci/node.toml", "[env]\nCI = \"true\"\n"),
        ]);

        let fragments = FilesystemFragmentLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(names(&fragments), ["ci/node", "lint/quality", "lint/react"]);
        assert_eq!(
            fragments[2].document().to_json(),
            json!({"extends": ["plugin:react/recommended"]})
        );
        assert_eq!(fragments[0].document().to_json(), json!({"env": {"CI": "true"}}));
    }

    #[test]
    fn load_all_continues_when_one_fragment_is_invalid() {
        let temp = make_fragment_dir(&[
            ("good.json", r#"{"a": 1}"#),
            ("broken.json", "{not json"),
            ("scalar.yaml", "just a string"),
        ]);

        let fragments = FilesystemFragmentLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(names(&fragments), ["good"]);
    }

    #[test]
    fn unrelated_and_hidden_files_are_ignored() {
        let temp = make_fragment_dir(&[
            ("README.md", "# fragments"),
            (".hidden/x.json", "{}"),
            ("ok.yml", "a: 1\n"),
        ]);

        let fragments = FilesystemFragmentLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(names(&fragments), ["ok"]);
    }

    #[test]
    fn duplicate_names_keep_first_file() {
        let temp = make_fragment_dir(&[("a.json", r#"{"from": "json"}"#), ("a.yaml", "from: yaml\n")]);

        let fragments = FilesystemFragmentLoader::new(temp.path()).load_all().unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].document().to_json(), json!({"from": "json"}));
    }

    // ── read_document ─────────────────────────────────────────────────────

    #[test]
    fn read_document_rejects_unknown_extension() {
        assert!(matches!(
            read_document(Path::new("codegen.ts")),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn empty_yaml_is_empty_document() {
        let doc = parse_document(Path::new("x.yml"), ArtifactFormat::Yaml, "\n").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn non_mapping_root_is_document_error() {
        let err = parse_document(Path::new("x.json"), ArtifactFormat::Json, "[1, 2]").unwrap_err();
        assert!(matches!(err, LoadError::Document { .. }));

        let converted: TesseraError = err.into();
        assert!(matches!(
            converted,
            TesseraError::Domain(DomainError::InvalidFragment { .. })
        ));
    }

    #[test]
    fn json_key_order_is_preserved() {
        let doc = parse_document(Path::new("x.json"), ArtifactFormat::Json, r#"{"z": 1, "a": 2}"#)
            .unwrap();
        let keys: Vec<&String> = doc.root().keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }
}
