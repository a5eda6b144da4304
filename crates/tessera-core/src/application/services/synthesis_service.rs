//! Synthesis Service - writes finished artifacts.
//!
//! The workflow for one run:
//! 1. Validate the artifact set (unique paths)
//! 2. Serialize every non-empty artifact
//! 3. Refuse to clobber existing files unless overwriting
//! 4. Write in order, rolling back files created by this run on failure
//!
//! Serialization happens before any write, so a document that cannot be
//! rendered never leaves partial output behind.

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{DocumentSerializer, Filesystem},
    },
    domain::{Artifact, DomainValidator as validator},
    error::TesseraResult,
};

/// How synthesis treats files that already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with `ArtifactExists` before writing anything.
    #[default]
    CreateNew,
    /// Replace existing files.
    Overwrite,
}

/// An artifact serialized and ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    pub content: String,
}

/// Outcome of a synthesis run. Paths are relative to the output root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl SynthesisReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

/// Artifact writing service.
pub struct SynthesisService {
    serializer: Box<dyn DocumentSerializer>,
    filesystem: Box<dyn Filesystem>,
}

impl SynthesisService {
    /// Create a new synthesis service with the given adapters.
    pub fn new(serializer: Box<dyn DocumentSerializer>, filesystem: Box<dyn Filesystem>) -> Self {
        Self {
            serializer,
            filesystem,
        }
    }

    /// Serialize one artifact without writing it.
    pub fn render_one(&self, artifact: &Artifact) -> TesseraResult<String> {
        self.serializer.serialize(artifact)
    }

    /// Serialize every non-empty artifact. Empty documents are left out.
    pub fn render(&self, artifacts: &[Artifact]) -> TesseraResult<Vec<RenderedArtifact>> {
        validator::validate_artifacts(artifacts)?;

        artifacts
            .iter()
            .filter(|a| !a.is_empty())
            .map(|artifact| {
                let content = self.serializer.serialize(artifact)?;
                Ok(RenderedArtifact {
                    path: artifact.path().as_path().to_path_buf(),
                    content,
                })
            })
            .collect()
    }

    /// Write artifacts below `root`.
    #[instrument(
        skip_all,
        fields(
            artifacts = artifacts.len(),
            root = %root.display(),
            mode = ?mode
        )
    )]
    pub fn synthesize(
        &self,
        artifacts: &[Artifact],
        root: &Path,
        mode: WriteMode,
    ) -> TesseraResult<SynthesisReport> {
        let rendered = self.render(artifacts)?;

        let skipped: Vec<PathBuf> = artifacts
            .iter()
            .filter(|a| a.is_empty())
            .map(|a| a.path().as_path().to_path_buf())
            .collect();
        for path in &skipped {
            debug!(path = %path.display(), "empty document, not written");
        }

        if mode == WriteMode::CreateNew {
            if let Some(existing) = rendered
                .iter()
                .map(|r| root.join(&r.path))
                .find(|p| self.filesystem.exists(p))
            {
                return Err(ApplicationError::ArtifactExists { path: existing }.into());
            }
        }

        let mut created = Vec::new();
        match self.write_all(&rendered, root, &mut created) {
            Ok(()) => {
                info!(written = rendered.len(), skipped = skipped.len(), "Synthesis complete");
                Ok(SynthesisReport {
                    written: rendered.into_iter().map(|r| r.path).collect(),
                    skipped,
                })
            }
            Err(e) => {
                warn!("Write failed, attempting rollback");
                match self.rollback(&created, &e.to_string()) {
                    Ok(()) => Err(e),
                    Err(rollback) => Err(rollback.into()),
                }
            }
        }
    }

    fn write_all(
        &self,
        rendered: &[RenderedArtifact],
        root: &Path,
        created: &mut Vec<PathBuf>,
    ) -> TesseraResult<()> {
        for artifact in rendered {
            let path = root.join(&artifact.path);
            if let Some(parent) = path.parent() {
                self.filesystem.create_dir_all(parent)?;
            }

            let existed = self.filesystem.exists(&path);
            self.filesystem.write_file(&path, &artifact.content)?;
            if !existed {
                created.push(path.clone());
            }
            debug!(path = %path.display(), bytes = artifact.content.len(), "artifact written");
        }
        Ok(())
    }

    /// Remove the files this run created. Every file is attempted; the
    /// first one left behind is reported as `RollbackFailed`.
    fn rollback(&self, created: &[PathBuf], cause: &str) -> Result<(), ApplicationError> {
        let mut first_failure = None;
        for path in created.iter().rev() {
            if let Err(e) = self.filesystem.remove_file(path) {
                warn!(
                    error = %e,
                    path = %path.display(),
                    "Rollback failed"
                );
                first_failure.get_or_insert(ApplicationError::RollbackFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                    cause: cause.to_string(),
                });
            }
        }
        info!(attempted = created.len(), "Rollback finished");
        first_failure.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockDocumentSerializer, MockFilesystem};
    use crate::domain::{ConfigDocument, DomainError};
    use crate::error::TesseraError;
    use mockall::predicate::{always, eq};
    use mockall::Sequence;

    fn artifact(path: &str) -> Artifact {
        Artifact::new(path, ConfigDocument::new().with("root", true)).unwrap()
    }

    fn echo_serializer() -> MockDocumentSerializer {
        let mut serializer = MockDocumentSerializer::new();
        serializer
            .expect_serialize()
            .returning(|a| Ok(format!("content of {}", a.path())));
        serializer
    }

    #[test]
    fn writes_artifacts_in_order() {
        let mut fs = MockFilesystem::new();
        let mut seq = Sequence::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file()
            .with(eq(Path::new("/out/a.json")), eq("content of a.json"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        fs.expect_write_file()
            .with(eq(Path::new("/out/ci/b.yml")), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let service = SynthesisService::new(Box::new(echo_serializer()), Box::new(fs));
        let report = service
            .synthesize(
                &[artifact("a.json"), artifact("ci/b.yml")],
                Path::new("/out"),
                WriteMode::CreateNew,
            )
            .unwrap();

        assert_eq!(
            report.written,
            [PathBuf::from("a.json"), PathBuf::from("ci/b.yml")]
        );
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn empty_documents_are_skipped() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().times(1).returning(|_, _| Ok(()));

        let empty = Artifact::new("empty.json", ConfigDocument::new()).unwrap();
        let service = SynthesisService::new(Box::new(echo_serializer()), Box::new(fs));
        let report = service
            .synthesize(&[empty, artifact("a.json")], Path::new("/out"), WriteMode::CreateNew)
            .unwrap();

        assert_eq!(report.written, [PathBuf::from("a.json")]);
        assert_eq!(report.skipped, [PathBuf::from("empty.json")]);
    }

    #[test]
    fn refuses_to_clobber_without_overwrite() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists()
            .with(eq(Path::new("/out/a.json")))
            .return_const(true);
        fs.expect_write_file().never();

        let service = SynthesisService::new(Box::new(echo_serializer()), Box::new(fs));
        let err = service
            .synthesize(&[artifact("a.json")], Path::new("/out"), WriteMode::CreateNew)
            .unwrap_err();
        assert!(matches!(
            err,
            TesseraError::Application(ApplicationError::ArtifactExists { .. })
        ));
    }

    #[test]
    fn serialization_failure_writes_nothing() {
        let mut serializer = MockDocumentSerializer::new();
        serializer.expect_serialize().returning(|a| {
            Err(ApplicationError::SerializationFailed {
                artifact: a.path().to_string(),
                reason: "null".into(),
            }
            .into())
        });
        let mut fs = MockFilesystem::new();
        fs.expect_write_file().never();

        let service = SynthesisService::new(Box::new(serializer), Box::new(fs));
        assert!(service
            .synthesize(&[artifact("a.toml")], Path::new("/out"), WriteMode::Overwrite)
            .is_err());
    }

    #[test]
    fn failed_write_rolls_back_created_files() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file()
            .with(eq(Path::new("/out/a.json")), always())
            .returning(|_, _| Ok(()));
        fs.expect_write_file()
            .with(eq(Path::new("/out/b.json")), always())
            .returning(|path, _| {
                Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "disk full".into(),
                }
                .into())
            });
        fs.expect_remove_file()
            .with(eq(Path::new("/out/a.json")))
            .times(1)
            .returning(|_| Ok(()));

        let service = SynthesisService::new(Box::new(echo_serializer()), Box::new(fs));
        let result = service.synthesize(
            &[artifact("a.json"), artifact("b.json")],
            Path::new("/out"),
            WriteMode::CreateNew,
        );
        assert!(matches!(
            result,
            Err(TesseraError::Application(ApplicationError::FilesystemError { .. }))
        ));
    }

    #[test]
    fn failed_rollback_reports_the_leftover_file() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file()
            .with(eq(Path::new("/out/a.json")), always())
            .returning(|_, _| Ok(()));
        fs.expect_write_file()
            .with(eq(Path::new("/out/b.json")), always())
            .returning(|path, _| {
                Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "disk full".into(),
                }
                .into())
            });
        fs.expect_remove_file().times(1).returning(|path| {
            Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "permission denied".into(),
            }
            .into())
        });

        let service = SynthesisService::new(Box::new(echo_serializer()), Box::new(fs));
        let err = service
            .synthesize(
                &[artifact("a.json"), artifact("b.json")],
                Path::new("/out"),
                WriteMode::CreateNew,
            )
            .unwrap_err();

        let TesseraError::Application(ApplicationError::RollbackFailed { path, reason, cause }) =
            &err
        else {
            panic!("expected RollbackFailed, got {err:?}");
        };
        assert_eq!(path.as_path(), Path::new("/out/a.json"));
        assert!(reason.contains("permission denied"));
        assert!(cause.contains("disk full"));
    }

    #[test]
    fn duplicate_paths_are_rejected_before_rendering() {
        let mut serializer = MockDocumentSerializer::new();
        serializer.expect_serialize().never();
        let fs = MockFilesystem::new();

        let service = SynthesisService::new(Box::new(serializer), Box::new(fs));
        let err = service
            .synthesize(
                &[artifact("a.json"), artifact("a.json")],
                Path::new("/out"),
                WriteMode::Overwrite,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TesseraError::Domain(DomainError::DuplicatePath { .. })
        ));
    }
}
