//! Project discovery and target selection shared by all commands.

use std::path::{Path, PathBuf};

use resembed_config::{load_config, load_config_from_str, EmbedConfig, CONFIG_FILE};

use crate::GlobalArgs;

/// Walks up from `start` looking for a directory containing `resembed.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project configuration selected by the global CLI args.
///
/// If `--config` names a file, that file is loaded and its directory is the
/// project root. If it names a directory, `resembed.toml` is loaded from it.
/// Otherwise walks up from the current directory.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, EmbedConfig), Box<dyn std::error::Error>> {
    match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                let content = std::fs::read_to_string(&p)?;
                let dir = p
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok((dir, load_config_from_str(&content)?))
            } else {
                let config = load_config(&p)?;
                Ok((p, config))
            }
        }
        None => {
            let dir = find_project_root(&std::env::current_dir()?)?;
            let config = load_config(&dir)?;
            Ok((dir, config))
        }
    }
}

/// Returns the requested targets, or every configured target when none are named.
///
/// Unknown names are an error; duplicates are dropped.
pub fn select_targets(
    config: &EmbedConfig,
    requested: &[String],
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if requested.is_empty() {
        return Ok(config.targets.keys().cloned().collect());
    }
    let mut selected: Vec<String> = Vec::with_capacity(requested.len());
    for name in requested {
        if !config.targets.contains_key(name) {
            return Err(format!("unknown target '{name}'").into());
        }
        if !selected.contains(name) {
            selected.push(name.clone());
        }
    }
    Ok(selected)
}
