//! Template assemblers.
//!
//! Each assembler is a thin, declarative use of the override and merge
//! engines that builds one artifact kind. None of them keep state between
//! synthesis runs: every `assemble`/`synthesize` call recomputes the
//! document from the current inputs.

pub mod codegen;
pub mod lint;
pub mod workflow;

pub use codegen::{CodegenConfig, CodegenConfigAssembler, CodegenOutput, output_path};
pub use lint::{LINT_ARRAY_PROPERTIES, LintConfigAssembler, lint_merge_policy};
pub use workflow::{
    CacheState, Capability, CiJobAssembler, DependencyCache, JobPermissions, PackageManager,
    PermissionLevel, Runtime, Trigger, WorkflowAssembler, WorkflowStep, job_merge_policy,
};
