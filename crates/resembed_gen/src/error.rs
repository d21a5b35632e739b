//! Error types for resource generation.

use std::path::PathBuf;

use resembed_cache::CacheError;
use resembed_common::{VirtualPath, VirtualPathError};
use resembed_config::ConfigError;

/// Errors that abort the generation of a target.
///
/// Every variant is fatal: the target's manifest is not published when one
/// of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The configuration could not be loaded or resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A resource root does not exist or is not a directory.
    #[error("target '{target}': resource root {} does not exist or is not a directory", path.display())]
    MissingRoot {
        /// The target being generated.
        target: String,
        /// The configured root.
        path: PathBuf,
    },

    /// A resource file or directory could not be read.
    #[error("cannot read resource {}: {source}", path.display())]
    Unreadable {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A discovered file resolves to a location outside its root.
    #[error("target '{target}': {} escapes resource root {}", path.display(), root.display())]
    Traversal {
        /// The target being generated.
        target: String,
        /// The offending file.
        path: PathBuf,
        /// The root it was discovered under.
        root: PathBuf,
    },

    /// A discovered file has no valid virtual path.
    #[error("target '{target}': invalid virtual path for {}: {source}", path.display())]
    InvalidPath {
        /// The target being generated.
        target: String,
        /// The offending file.
        path: PathBuf,
        /// Why the path was rejected.
        source: VirtualPathError,
    },

    /// Two files map to the same virtual path within one target.
    #[error(
        "target '{target}': duplicate virtual path '{path}' from {} and {}",
        first.display(),
        second.display()
    )]
    Duplicate {
        /// The target being generated.
        target: String,
        /// The contested virtual path.
        path: VirtualPath,
        /// The file discovered first.
        first: PathBuf,
        /// The conflicting file.
        second: PathBuf,
    },

    /// Two virtual paths hash to the same unit key.
    #[error("target '{target}': unit key {key} is shared by '{first}' and '{second}'")]
    UnitKeyCollision {
        /// The target being generated.
        target: String,
        /// The contested key.
        key: String,
        /// One virtual path.
        first: VirtualPath,
        /// The other virtual path.
        second: VirtualPath,
    },

    /// A written unit does not match the resource it was generated from.
    #[error("target '{target}': verification of '{path}' failed: {source}")]
    Verification {
        /// The target being generated.
        target: String,
        /// The resource whose unit failed verification.
        path: VirtualPath,
        /// The mismatch.
        source: CacheError,
    },

    /// Writing units or the record failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// An I/O error outside the unit store.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An include or exclude glob is malformed.
    #[error("target '{target}': invalid glob '{pattern}': {reason}")]
    Glob {
        /// The target being generated.
        target: String,
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The worker pool could not be created.
    #[error("failed to create worker pool: {0}")]
    ThreadPool(String),

    /// A variable Cargo sets for build scripts is missing.
    #[error("environment variable {0} is not set; is this running from a build script?")]
    MissingEnv(&'static str),
}
