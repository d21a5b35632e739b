//! Parsing and validation of `resembed.toml` embedding configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`EmbedConfig`] with per-target resolution of resource roots, filters,
//! output directories, and chunk sizes.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{is_valid_target_name, load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::{
    check_out_dir, default_prefix, normalize_path, resolve_out_dir, resolve_target, ResolvedRoot,
    ResolvedTarget, TargetOverrides,
};
pub use types::*;
