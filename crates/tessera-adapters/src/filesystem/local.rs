//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use tessera_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{TesseraError, TesseraResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> TesseraResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> TesseraResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_file(&self, path: &Path) -> TesseraResult<()> {
        std::fs::remove_file(path).map_err(|e| map_io_error(path, e, "remove file"))
    }
}

pub(crate) fn map_io_error(path: &Path, e: io::Error, operation: &str) -> TesseraError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_removes_files() {
        let temp = TempDir::new().unwrap();
        let fs = LocalFilesystem::new();
        let dir = temp.path().join(".github/workflows");
        let file = dir.join("ci.yml");

        fs.create_dir_all(&dir).unwrap();
        fs.write_file(&file, "name: ci\n").unwrap();
        assert!(fs.exists(&file));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "name: ci\n");

        fs.remove_file(&file).unwrap();
        assert!(!fs.exists(&file));
    }

    #[test]
    fn write_into_missing_directory_reports_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("missing/a.json");

        let err = LocalFilesystem::new().write_file(&file, "{}").unwrap_err();
        match err {
            TesseraError::Application(ApplicationError::FilesystemError { path, reason }) => {
                assert_eq!(path, file);
                assert!(reason.starts_with("Failed to write file"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
