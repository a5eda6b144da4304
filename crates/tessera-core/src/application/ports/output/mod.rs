//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `tessera-adapters` crate provides implementations.

use std::path::Path;

use crate::domain::{Artifact, Fragment};
use crate::error::TesseraResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `tessera_adapters::filesystem::LocalFilesystem` (production)
/// - `tessera_adapters::filesystem::MemoryFilesystem` (testing, dry runs)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> TesseraResult<()>;

    /// Write content to a file, replacing any existing content.
    fn write_file(&self, path: &Path, content: &str) -> TesseraResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> TesseraResult<()>;
}

/// Port for turning a finished artifact into file content.
///
/// Implemented by:
/// - `tessera_adapters::serializer::StructuredSerializer` (JSON, YAML, TOML)
#[cfg_attr(test, mockall::automock)]
pub trait DocumentSerializer: Send + Sync {
    /// Render the artifact's document in its format, including the marker
    /// comment when the format has one.
    fn serialize(&self, artifact: &Artifact) -> TesseraResult<String>;
}

/// Port for fragment storage and retrieval.
///
/// Implemented by:
/// - `tessera_adapters::fragment_store::InMemoryStore` (built-in and loaded fragments)
#[cfg_attr(test, mockall::automock)]
pub trait FragmentStore: Send + Sync {
    /// Get a fragment by name.
    fn get(&self, name: &str) -> TesseraResult<Fragment>;

    /// List all fragments, sorted by name.
    fn list(&self) -> TesseraResult<Vec<Fragment>>;

    /// Insert or replace a fragment.
    fn insert(&self, fragment: Fragment) -> TesseraResult<()>;

    /// Remove a fragment.
    fn remove(&self, name: &str) -> TesseraResult<()>;
}
