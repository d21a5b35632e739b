//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a `resembed.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A referenced target name does not exist in the configuration.
    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    /// A target name cannot be used as a Rust identifier.
    #[error("invalid target name '{0}': must match [A-Za-z_][A-Za-z0-9_]* and not be a Rust keyword")]
    InvalidTargetName(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configured resource root does not exist or is not a directory.
    #[error("target '{target}': resource root {} does not exist or is not a directory", path.display())]
    MissingRoot {
        /// The target that references the root.
        target: String,
        /// The resolved root path.
        path: PathBuf,
    },

    /// A resource root lies inside the output directory, which generation
    /// and `clean` overwrite.
    #[error(
        "target '{target}': resource root {} is inside output directory {}",
        root.display(),
        out_dir.display()
    )]
    RootInOutDir {
        /// The target that references the root.
        target: String,
        /// The resolved root path.
        root: PathBuf,
        /// The resolved base output directory.
        out_dir: PathBuf,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
