//! Command handlers.
//!
//! Each handler translates parsed arguments into core calls and hands the
//! finished document to [`emit`]. Helpers shared by several handlers live
//! here.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use tessera_adapters::{InMemoryStore, LocalFilesystem, StructuredSerializer, builtin_fragments};
use tessera_core::{
    application::{ApplicationError, FragmentStore, SynthesisService, WriteMode},
    domain::{
        Artifact, ArtifactFormat, ArtifactPath, ConfigDocument, ConfigNode, DEFAULT_MARKER,
        DomainError, OverrideSet,
    },
};

use crate::{
    cli::{EmitArgs, GlobalArgs, OverrideArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

pub mod codegen;
pub mod completions;
pub mod config;
pub mod fragments;
pub mod init;
pub mod lint;
pub mod merge;
pub mod workflow;

// ── fragment store ────────────────────────────────────────────────────────────

/// Built-in fragments plus user fragments.
///
/// An explicit directory (`--fragments-dir`, then `fragments.dir`) replaces
/// discovery. User fragments replace built-ins of the same name.
#[instrument(skip_all)]
pub fn build_store(global: &GlobalArgs, config: &AppConfig) -> CliResult<InMemoryStore> {
    let store = InMemoryStore::with_builtin()?;

    match global.fragments_dir.as_ref().or(config.fragments.dir.as_ref()) {
        Some(dir) => {
            let count = store.load_dir(dir)?;
            debug!(dir = %dir.display(), count, "user fragments loaded");
        }
        None => {
            for fragment in builtin_fragments::discover_user_fragments()? {
                store.insert(fragment)?;
            }
        }
    }

    Ok(store)
}

// ── argument parsing ──────────────────────────────────────────────────────────

/// Parse a command-line value: JSON when it parses, a plain string otherwise.
///
/// `true`, `42`, `["a","b"]` and `null` become typed nodes; `src/**/*.ts`
/// stays a string.
pub fn parse_value(raw: &str) -> ConfigNode {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(ConfigNode::from)
        .unwrap_or_else(|_| ConfigNode::from(raw))
}

/// Split `KEY=VALUE` at the first `=`. The key must not be empty.
pub fn split_assignment<'a>(
    flag: &'static str,
    input: &'a str,
    expected: &'static str,
) -> CliResult<(&'a str, &'a str)> {
    match input.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(CliError::InvalidAssignment {
            flag,
            input: input.to_string(),
            expected,
        }),
    }
}

/// `--set` and `--unset` as ordered `(path, value)` pairs. Every `--unset`
/// comes after every `--set`.
pub fn override_entries(args: &OverrideArgs) -> CliResult<Vec<(String, Option<ConfigNode>)>> {
    let mut entries = Vec::with_capacity(args.set.len() + args.unset.len());
    for raw in &args.set {
        let (path, value) = split_assignment("--set", raw, "PATH=VALUE")?;
        entries.push((path.to_string(), Some(parse_value(value))));
    }
    for path in &args.unset {
        entries.push((path.clone(), None));
    }
    Ok(entries)
}

/// Collect `--set` and `--unset` into an [`OverrideSet`].
pub fn override_set(args: &OverrideArgs) -> CliResult<OverrideSet> {
    let mut set = OverrideSet::new();
    for (path, value) in override_entries(args)? {
        set.add(&path, value)?;
    }
    Ok(set)
}

// ── emitting ──────────────────────────────────────────────────────────────────

/// Print `document` to stdout, or write it to `--out`.
///
/// Stdout uses `--format`, falling back to `output.format` from config. A
/// file takes its format from `--format` or its extension. Empty documents
/// are never written.
pub fn emit(
    document: ConfigDocument,
    args: &EmitArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    let Some(out) = &args.out else {
        return print_document(&document, args, config, output);
    };

    let (root, relative) = split_output_path(out)?;
    let path = ArtifactPath::try_new(relative)?;
    let format = match args.format {
        Some(format) => format.into(),
        None => path
            .format()
            .ok_or_else(|| DomainError::UnknownFormat(path.to_string()))?,
    };

    let mut artifact = Artifact::with_format(path, format, document);
    if !args.no_marker && config.output.marker {
        artifact = artifact.marker(DEFAULT_MARKER);
    }

    let service = SynthesisService::new(
        Box::new(StructuredSerializer::new()),
        Box::new(LocalFilesystem::new()),
    );

    if args.dry_run {
        let rendered = service.render(std::slice::from_ref(&artifact))?;
        if rendered.is_empty() {
            output.warning(&format!("{} would be empty; nothing to write", artifact.path()))?;
        }
        for item in rendered {
            output.info(&format!(
                "Dry run: would write {}",
                root.join(&item.path).display()
            ))?;
            output.document(&item.content)?;
        }
        return Ok(());
    }

    let mode = if args.force {
        WriteMode::Overwrite
    } else {
        WriteMode::CreateNew
    };
    let report = service.synthesize(&[artifact], &root, mode)?;

    for path in &report.written {
        output.file_status("wrote", &root.join(path).display().to_string())?;
    }
    for path in &report.skipped {
        output.warning(&format!("{} is empty; not written", path.display()))?;
    }
    Ok(())
}

fn print_document(
    document: &ConfigDocument,
    args: &EmitArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<()> {
    if document.is_empty() {
        output.warning("Merged document is empty; nothing to print")?;
        return Ok(());
    }

    let format = match args.format {
        Some(format) => format.into(),
        None => config.output.format.parse::<ArtifactFormat>()?,
    };
    let content = StructuredSerializer::render(format, document).map_err(|reason| {
        CliError::Core(
            ApplicationError::SerializationFailed {
                artifact: "<stdout>".into(),
                reason,
            }
            .into(),
        )
    })?;
    output.document(&content)?;
    Ok(())
}

/// Split `--out` into an output root and a path relative to it.
///
/// Relative paths are taken from the current directory. An absolute path
/// becomes its parent directory plus file name.
fn split_output_path(out: &Path) -> CliResult<(PathBuf, PathBuf)> {
    if out.is_absolute() {
        let file_name = out.file_name().ok_or_else(|| CliError::InvalidInput {
            message: format!("'{}' does not name a file", out.display()),
            source: None,
        })?;
        let parent = out.parent().unwrap_or_else(|| Path::new("/"));
        return Ok((parent.to_path_buf(), PathBuf::from(file_name)));
    }

    let cwd = std::env::current_dir().map_err(|e| CliError::IoError {
        message: "Failed to read the current directory".into(),
        source: e,
    })?;
    Ok((cwd, out.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_parse_as_json_first() {
        assert_eq!(parse_value("true").to_json(), json!(true));
        assert_eq!(parse_value("42").to_json(), json!(42));
        assert_eq!(parse_value("[\"a\",\"b\"]").to_json(), json!(["a", "b"]));
        assert_eq!(parse_value("\"quoted\"").to_json(), json!("quoted"));
    }

    #[test]
    fn values_fall_back_to_strings() {
        assert_eq!(parse_value("src/**/*.ts").to_json(), json!("src/**/*.ts"));
        assert_eq!(parse_value("").to_json(), json!(""));
    }

    #[test]
    fn assignment_splits_at_first_equals() {
        let (key, value) = split_assignment("--set", "env.A=b=c", "PATH=VALUE").unwrap();
        assert_eq!(key, "env.A");
        assert_eq!(value, "b=c");
    }

    #[test]
    fn assignment_requires_key() {
        assert!(matches!(
            split_assignment("--set", "=x", "PATH=VALUE"),
            Err(CliError::InvalidAssignment { .. })
        ));
        assert!(split_assignment("--set", "novalue", "PATH=VALUE").is_err());
    }

    #[test]
    fn unsets_apply_after_sets() {
        let args = OverrideArgs {
            set: vec!["a.b=1".into(), "a.c=2".into()],
            unset: vec!["a.b".into()],
        };
        let document = override_set(&args)
            .unwrap()
            .apply_to(ConfigDocument::new())
            .unwrap();
        assert_eq!(document.to_json(), json!({"a": {"c": 2}}));
    }

    #[test]
    fn malformed_override_path_is_rejected() {
        let args = OverrideArgs {
            set: vec!["a.b\\=1".into()],
            unset: vec![],
        };
        assert!(matches!(override_set(&args), Err(CliError::Core(_))));
    }

    #[test]
    fn absolute_out_splits_into_root_and_name() {
        let out = std::env::temp_dir().join("codegen.yml");
        let (root, relative) = split_output_path(&out).unwrap();
        assert_eq!(root, std::env::temp_dir());
        assert_eq!(relative, PathBuf::from("codegen.yml"));
    }
}
