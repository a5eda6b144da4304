//! Application layer for tessera.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (SynthesisService, FragmentService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! document logic itself. Merge and override rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    FragmentInfo, // DTO for fragment listings
    FragmentService,
    SynthesisReport,
    SynthesisService,
    WriteMode,
};

// Re-export port traits (for adapter implementation)
pub use ports::{DocumentSerializer, Filesystem, FragmentStore};

pub use error::ApplicationError;
