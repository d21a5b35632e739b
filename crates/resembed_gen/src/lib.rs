//! Build-time generation of embedded resource targets.
//!
//! For each target the pipeline scans the configured roots, writes one blob
//! unit per changed resource (in parallel), and renders a `manifest.rs` that
//! the `resembed` crate includes into application code. Unchanged resources
//! are skipped using the record kept by `resembed_cache`.
//!
//! From a build script, use [`Embed`]. Tools drive [`generate_target`]
//! directly with a [`ResolvedTarget`](resembed_config::ResolvedTarget).

#![warn(missing_docs)]

pub mod blob;
pub mod build_script;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod scanner;

pub use build_script::{Embed, OUT_SUBDIR};
pub use error::GenerateError;
pub use manifest::{manifest_path, MANIFEST_FILE};
pub use pipeline::{clean_target, generate_target, GenerateOptions, GenerationReport, TOOL_VERSION};
pub use scanner::{scan_target, ResourceRecord};
