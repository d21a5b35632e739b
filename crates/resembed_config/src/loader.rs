//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::EmbedConfig;
use resembed_common::VirtualPath;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "resembed.toml";

/// Loads and validates a `resembed.toml` configuration from a project directory.
///
/// Reads `<project_dir>/resembed.toml`, parses it, and validates every target.
pub fn load_config(project_dir: &Path) -> Result<EmbedConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `resembed.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EmbedConfig, ConfigError> {
    let config: EmbedConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Strict and reserved Rust keywords, across all editions.
const RUST_KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Returns `true` if `name` can be used as a target name.
///
/// Target names become module names and part of generated macro
/// identifiers, so they follow Rust identifier rules (ASCII only) and may
/// not be keywords.
pub fn is_valid_target_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "_"
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RUST_KEYWORDS.contains(&name)
}

/// Validates that every target is well formed before any generation starts.
fn validate_config(config: &EmbedConfig) -> Result<(), ConfigError> {
    if config.generate.out_dir.is_empty() {
        return Err(ConfigError::MissingField("generate.out_dir".to_string()));
    }
    if config.generate.chunk_size.bytes() == 0 {
        return Err(ConfigError::ValidationError(
            "generate.chunk_size must be greater than zero".to_string(),
        ));
    }
    if config.generate.jobs == Some(0) {
        return Err(ConfigError::ValidationError(
            "generate.jobs must be greater than zero".to_string(),
        ));
    }

    for (name, target) in &config.targets {
        if !is_valid_target_name(name) {
            return Err(ConfigError::InvalidTargetName(name.clone()));
        }
        if target.roots.is_empty() {
            return Err(ConfigError::MissingField(format!("targets.{name}.roots")));
        }
        for root in &target.roots {
            if root.path().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "target '{name}': root path is empty"
                )));
            }
            if let Some(prefix) = root.prefix() {
                // An empty prefix is allowed and mounts at the top level.
                if !prefix.is_empty() {
                    VirtualPath::parse(prefix).map_err(|e| {
                        ConfigError::ValidationError(format!(
                            "target '{name}': invalid prefix '{prefix}': {e}"
                        ))
                    })?;
                }
            }
        }
        if target.chunk_size.is_some_and(|size| size.bytes() == 0) {
            return Err(ConfigError::ValidationError(format!(
                "target '{name}': chunk_size must be greater than zero"
            )));
        }
        if target.out_dir.as_deref() == Some("") {
            return Err(ConfigError::ValidationError(format!(
                "target '{name}': out_dir is empty"
            )));
        }
    }
    Ok(())
}
