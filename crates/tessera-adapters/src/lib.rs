//! Infrastructure adapters for tessera.
//!
//! This crate implements the ports defined in `tessera-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod builtin_fragments;
pub mod filesystem;
pub mod fragment_loader;
pub mod fragment_store;
pub mod serializer;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use fragment_loader::FilesystemFragmentLoader;
pub use fragment_store::InMemoryStore;
pub use serializer::StructuredSerializer;
