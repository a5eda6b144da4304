// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for tessera.
//!
//! Pure in-memory tree transformations: parsing override paths, applying
//! overrides, merging fragments and assembling artifacts. All I/O and
//! serialization happen behind ports defined in the application layer.
//!
//! - **No async, no I/O**: every operation is a synchronous function of its inputs
//! - **No retained state**: documents are rebuilt from scratch on each run
//! - **Closed node type**: merge and override dispatch on [`ConfigNode`] tags
//!
// Public API - what the world sees
pub mod artifact;
pub mod assemblers;
pub mod document;
pub mod error;
pub mod merge;
pub mod overrides;
pub mod path;

mod validation;

// Re-exports for convenience
pub use artifact::{Artifact, ArtifactFormat, ArtifactPath, DEFAULT_MARKER};
pub use assemblers::{
    CacheState, Capability, CiJobAssembler, CodegenConfig, CodegenConfigAssembler, CodegenOutput,
    DependencyCache, JobPermissions, LINT_ARRAY_PROPERTIES, LintConfigAssembler, PackageManager,
    PermissionLevel, Runtime, Trigger, WorkflowAssembler, WorkflowStep, job_merge_policy,
    lint_merge_policy,
};
pub use document::{ConfigDocument, ConfigNode, Fragment, Mapping, Scalar};
pub use error::{DomainError, DomainResult, ErrorCategory};
pub use merge::{MergePolicy, ShapeMismatch, merge, merge_documents};
pub use overrides::{Override, OverrideOp, OverrideSet, append_override, apply_override};
pub use path::{OverridePath, PathSyntax, escape_segment, escape_segment_with};
pub use validation::DomainValidator;
