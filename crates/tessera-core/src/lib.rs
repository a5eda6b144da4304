//! tessera core: composing configuration fragments into generated artifacts.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            tessera-cli (CLI)            │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (SynthesisService, FragmentService)    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Filesystem, Serializer, FragmentStore) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   tessera-adapters (Infrastructure)     │
//! └─────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │ fragments → merge/override → document   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use tessera_core::domain::{Fragment, LintConfigAssembler};
//!
//! let quality = Fragment::from_json("quality", json!({"rules": {"curly": "error"}}))?;
//! let formatting = Fragment::from_json("formatting", json!({"rules": {"semi": "off"}}))?;
//! let react = Fragment::from_json("react", json!({"plugins": ["react"]}))?;
//!
//! let config = LintConfigAssembler::new(quality, formatting)
//!     .with_fragment(react)
//!     .assemble()?;
//! assert_eq!(config.len(), 2);
//! # Ok::<(), tessera_core::domain::DomainError>(())
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        FragmentService, SynthesisReport, SynthesisService, WriteMode,
        ports::{DocumentSerializer, Filesystem, FragmentStore},
    };
    pub use crate::domain::{
        Artifact, ArtifactFormat, CiJobAssembler, CodegenConfigAssembler, ConfigDocument,
        ConfigNode, Fragment, LintConfigAssembler, MergePolicy, OverridePath, OverrideSet,
        ShapeMismatch, WorkflowAssembler, merge,
    };
    pub use crate::error::{TesseraError, TesseraResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
