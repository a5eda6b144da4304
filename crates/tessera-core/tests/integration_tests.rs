//! Integration tests for tessera-core.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tessera_core::{
    application::{DocumentSerializer, Filesystem, SynthesisService, WriteMode},
    domain::{
        Artifact, CacheState, CiJobAssembler, CodegenConfigAssembler, ConfigDocument, ConfigNode,
        DependencyCache, Fragment, LintConfigAssembler, MergePolicy, OverridePath,
        PackageManager, Runtime, apply_override, lint_merge_policy, merge, merge_documents,
    },
    error::TesseraResult,
};

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Clone, Default)]
struct RecordingFilesystem {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
}

impl Filesystem for RecordingFilesystem {
    fn create_dir_all(&self, _path: &Path) -> TesseraResult<()> {
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> TesseraResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn remove_file(&self, path: &Path) -> TesseraResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

struct JsonSerializer;

impl DocumentSerializer for JsonSerializer {
    fn serialize(&self, artifact: &Artifact) -> TesseraResult<String> {
        Ok(serde_json::to_string_pretty(artifact.document()).unwrap())
    }
}

fn doc(value: serde_json::Value) -> ConfigDocument {
    ConfigDocument::try_from(value).unwrap()
}

fn frag(name: &str, value: serde_json::Value) -> Fragment {
    Fragment::from_json(name, value).unwrap()
}

// ============================================================================
// Override properties
// ============================================================================

#[test]
fn override_is_idempotent() {
    let base = doc(json!({"a": {"b": 1}, "c": [1, 2]}));
    let cases = [
        ("a.b", Some(ConfigNode::from(2i64))),
        ("a.new.deep", Some(ConfigNode::from("x"))),
        ("c", None),
        ("a.b", None),
    ];

    for (path, value) in cases {
        let path = OverridePath::parse(path).unwrap();
        let mut once = base.clone();
        apply_override(&mut once, &path, value.clone());
        let mut twice = once.clone();
        apply_override(&mut twice, &path, value);
        assert_eq!(once, twice, "override at '{path}' is not idempotent");
    }
}

#[test]
fn deleting_absent_path_is_noop() {
    let base = doc(json!({"generates": {"out.ts": {"plugins": ["x"]}}}));
    let mut d = base.clone();
    apply_override(
        &mut d,
        &OverridePath::parse("generates.other\\.ts.documents").unwrap(),
        None,
    );
    assert_eq!(d, base);
}

#[test]
fn escaped_path_resolves_to_raw_segments() {
    let path = OverridePath::parse("generates.schema\\.graphql.documents").unwrap();
    assert_eq!(path.segments(), ["generates", "schema.graphql", "documents"]);
}

// ============================================================================
// Merge properties
// ============================================================================

#[test]
fn concat_merge_is_chunking_independent() {
    let fragments = [
        frag("a", json!({"extends": ["a"]})),
        frag("b", json!({"extends": ["b"]})),
        frag("c", json!({"extends": ["c"]})),
    ];
    let policy = lint_merge_policy();

    let all_at_once = merge(&fragments, &policy).unwrap();
    let pairwise = fragments
        .iter()
        .map(Fragment::document)
        .try_fold(ConfigDocument::new(), |acc, next| {
            merge_documents([&acc, next], &policy)
        })
        .unwrap();

    assert_eq!(all_at_once.to_json(), json!({"extends": ["a", "b", "c"]}));
    assert_eq!(all_at_once, pairwise);
}

#[test]
fn later_scalar_wins() {
    let merged = merge(
        &[frag("a", json!({"overwrite": true})), frag("b", json!({"overwrite": false}))],
        &MergePolicy::new(),
    )
    .unwrap();
    assert_eq!(merged.to_json(), json!({"overwrite": false}));
}

#[test]
fn empty_fragment_list_skips_output() {
    let merged = merge(&[], &lint_merge_policy()).unwrap();
    assert!(merged.is_empty());

    let fs = RecordingFilesystem::default();
    let service = SynthesisService::new(Box::new(JsonSerializer), Box::new(fs.clone()));
    let report = service
        .synthesize(
            &[Artifact::new(".eslintrc.json", merged).unwrap()],
            Path::new("/project"),
            WriteMode::CreateNew,
        )
        .unwrap();

    assert!(report.written.is_empty());
    assert_eq!(report.skipped, [PathBuf::from(".eslintrc.json")]);
    assert!(fs.files.lock().unwrap().is_empty());
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn codegen_override_end_to_end() {
    let base = doc(json!({
        "schema": "a.graphql",
        "generates": {"out.ts": {"documents": "src/**/*.ts", "plugins": ["typescript"]}}
    }));
    let mut assembler = CodegenConfigAssembler::new(base);
    assembler
        .override_documents_for_output("out.ts", Some("src/other/*.ts".into()))
        .unwrap();
    let document = assembler.synthesize().unwrap();

    let fs = RecordingFilesystem::default();
    let service = SynthesisService::new(Box::new(JsonSerializer), Box::new(fs.clone()));
    service
        .synthesize(
            &[Artifact::new("codegen.json", document).unwrap()],
            Path::new("/project"),
            WriteMode::CreateNew,
        )
        .unwrap();

    let files = fs.files.lock().unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&files[Path::new("/project/codegen.json")]).unwrap();
    assert_eq!(
        written,
        json!({
            "schema": "a.graphql",
            "generates": {"out.ts": {"documents": "src/other/*.ts", "plugins": ["typescript"]}}
        })
    );
}

#[test]
fn lint_assembly_end_to_end() {
    let quality = frag(
        "quality",
        json!({"rules": {"curly": ["error"]}, "extends": ["plugin:import/typescript"]}),
    );
    let formatting = frag(
        "formatting",
        json!({"rules": {"padding-line-between-statements": ["error"]}, "extends": []}),
    );
    let react = frag(
        "react",
        json!({"extends": ["plugin:react/recommended"], "plugins": ["react"]}),
    );

    let config = LintConfigAssembler::new(quality, formatting)
        .with_fragment(react)
        .assemble()
        .unwrap();

    assert_eq!(
        config.get("extends").unwrap().to_json(),
        json!(["plugin:import/typescript", "plugin:react/recommended"])
    );
    assert_eq!(
        config.get("rules").unwrap().to_json(),
        json!({"curly": ["error"], "padding-line-between-statements": ["error"]})
    );
}

#[test]
fn ci_job_cache_policy_end_to_end() {
    let job = |hit: bool| {
        CiJobAssembler::new("build")
            .runtime(Runtime::Node, None)
            .package_manager(PackageManager::Npm)
            .cache(DependencyCache::new("9f86d081", CacheState::from_hit(hit)))
            .command("npm test")
            .assemble()
            .unwrap()
    };
    let has_install = |d: &ConfigDocument| {
        d.get("steps")
            .and_then(ConfigNode::as_sequence)
            .unwrap()
            .iter()
            .any(|s| s.get("name").and_then(ConfigNode::as_str) == Some("Install dependencies"))
    };

    assert!(has_install(&job(false)));
    assert!(!has_install(&job(true)));
    assert_eq!(job(true), job(true));
    assert_eq!(job(false), job(false));
}

#[test]
fn rerunning_synthesis_requires_overwrite() {
    let fs = RecordingFilesystem::default();
    let service = SynthesisService::new(Box::new(JsonSerializer), Box::new(fs.clone()));
    let artifacts = [Artifact::new("a.json", doc(json!({"k": 1}))).unwrap()];

    service
        .synthesize(&artifacts, Path::new("/p"), WriteMode::CreateNew)
        .unwrap();
    assert!(service
        .synthesize(&artifacts, Path::new("/p"), WriteMode::CreateNew)
        .is_err());
    let report = service
        .synthesize(&artifacts, Path::new("/p"), WriteMode::Overwrite)
        .unwrap();
    assert_eq!(report.written, [PathBuf::from("a.json")]);
}
