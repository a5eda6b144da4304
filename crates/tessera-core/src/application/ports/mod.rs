//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `tessera-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `DocumentSerializer`: Document → text in the artifact's format
//!   - `FragmentStore`: Fragment storage/retrieval
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{DocumentSerializer, Filesystem, FragmentStore};

#[cfg(test)]
pub use output::{MockDocumentSerializer, MockFilesystem, MockFragmentStore};
