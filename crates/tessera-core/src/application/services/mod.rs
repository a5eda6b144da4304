//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "write these artifacts" or "resolve fragments".

pub mod fragment_service;
pub mod synthesis_service;

pub use fragment_service::{FragmentInfo, FragmentService};
pub use synthesis_service::{SynthesisReport, SynthesisService, WriteMode};
