//! Target resolution: merging global and target-specific settings.

use crate::error::ConfigError;
use crate::types::{EmbedConfig, TargetConfig};
use std::path::{Path, PathBuf};

/// A resource root with an absolute path and its virtual prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoot {
    /// Absolute (project-relative paths are joined onto the project dir) root directory.
    pub path: PathBuf,
    /// Virtual path prefix for every file under this root; may be empty.
    pub prefix: String,
}

/// A fully resolved target with global and target-specific settings merged.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// The target name; also the namespace of its generated items.
    pub name: String,
    /// Resource roots in configuration order.
    pub roots: Vec<ResolvedRoot>,
    /// Include globs (empty = everything).
    pub include: Vec<String>,
    /// Exclude globs.
    pub exclude: Vec<String>,
    /// Base output directory; the target's units live in [`target_dir`](Self::target_dir).
    pub out_dir: PathBuf,
    /// Maximum bytes per generated blob unit.
    pub chunk_size: u64,
    /// Module path the generated manifest is mounted at.
    pub mount: String,
    /// Worker thread count for blob generation.
    pub jobs: Option<usize>,
}

impl ResolvedTarget {
    /// Returns the directory holding this target's manifest, blobs, and record.
    pub fn target_dir(&self) -> PathBuf {
        self.out_dir.join(&self.name)
    }
}

/// Command-line overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    /// Replacement resource roots; each is mounted under its default prefix.
    pub roots: Vec<PathBuf>,
    /// Replacement base output directory.
    pub out_dir: Option<PathBuf>,
}

/// Returns the default virtual prefix for a root: its final path component.
///
/// Roots such as `.` that have no final component mount at the top level.
pub fn default_prefix(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Resolves a named target by merging global settings with target-specific
/// and command-line overrides.
///
/// Relative paths are resolved against `project_dir`. Every root must exist
/// and be a directory; a missing root is reported here, before any
/// generation starts.
pub fn resolve_target(
    config: &EmbedConfig,
    target_name: &str,
    project_dir: &Path,
    overrides: &TargetOverrides,
) -> Result<ResolvedTarget, ConfigError> {
    let target = config
        .targets
        .get(target_name)
        .ok_or_else(|| ConfigError::UnknownTarget(target_name.to_string()))?;

    let roots = configured_roots(target, project_dir, overrides);
    for root in &roots {
        if !root.path.is_dir() {
            return Err(ConfigError::MissingRoot {
                target: target_name.to_string(),
                path: root.path.clone(),
            });
        }
    }

    let out_dir = resolve_out_dir(config, target_name, project_dir, overrides)?;

    let chunk_size = target
        .chunk_size
        .unwrap_or(config.generate.chunk_size)
        .bytes();

    let mount = target
        .mount
        .clone()
        .unwrap_or_else(|| format!("crate::{target_name}"));

    Ok(ResolvedTarget {
        name: target_name.to_string(),
        roots,
        include: target.include.clone(),
        exclude: target.exclude.clone(),
        out_dir,
        chunk_size,
        mount,
        jobs: config.generate.jobs,
    })
}

/// Resolves the base output directory of a target without requiring its
/// roots to exist.
///
/// The command-line override wins over the target setting, which wins over
/// the global `[generate]` setting. A root inside the output directory is
/// rejected, since generation and cleaning would overwrite it.
pub fn resolve_out_dir(
    config: &EmbedConfig,
    target_name: &str,
    project_dir: &Path,
    overrides: &TargetOverrides,
) -> Result<PathBuf, ConfigError> {
    let target = config
        .targets
        .get(target_name)
        .ok_or_else(|| ConfigError::UnknownTarget(target_name.to_string()))?;
    let out_dir = match (&overrides.out_dir, &target.out_dir) {
        (Some(dir), _) => absolutize(project_dir, dir),
        (None, Some(dir)) => absolutize(project_dir, Path::new(dir)),
        (None, None) => absolutize(project_dir, Path::new(&config.generate.out_dir)),
    };
    check_out_dir(
        target_name,
        &configured_roots(target, project_dir, overrides),
        &out_dir,
    )?;
    Ok(out_dir)
}

/// Fails if any root lies inside (or is) the output directory.
///
/// An output directory inside a root is allowed; the scanner skips it.
pub fn check_out_dir(
    target_name: &str,
    roots: &[ResolvedRoot],
    out_dir: &Path,
) -> Result<(), ConfigError> {
    let out = normalize_path(out_dir);
    for root in roots {
        if normalize_path(&root.path).starts_with(&out) {
            return Err(ConfigError::RootInOutDir {
                target: target_name.to_string(),
                root: root.path.clone(),
                out_dir: out_dir.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Resolves symlinks in the longest existing prefix of `path` and appends
/// the rest unchanged, so paths that do not exist yet still compare with
/// canonical ones.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return rest.iter().rev().fold(canonical, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Roots of a target as configured, or as replaced on the command line.
fn configured_roots(
    target: &TargetConfig,
    project_dir: &Path,
    overrides: &TargetOverrides,
) -> Vec<ResolvedRoot> {
    if overrides.roots.is_empty() {
        target
            .roots
            .iter()
            .map(|spec| {
                let path = absolutize(project_dir, Path::new(spec.path()));
                let prefix = match spec.prefix() {
                    Some(prefix) => prefix.to_string(),
                    None => default_prefix(Path::new(spec.path())),
                };
                ResolvedRoot { path, prefix }
            })
            .collect()
    } else {
        overrides
            .roots
            .iter()
            .map(|root| ResolvedRoot {
                path: absolutize(project_dir, root),
                prefix: default_prefix(root),
            })
            .collect()
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn project_with_dirs(dirs: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for d in dirs {
            std::fs::create_dir_all(dir.path().join(d)).unwrap();
        }
        dir
    }

    #[test]
    fn resolve_basic_target() {
        let project = project_with_dirs(&["resources"]);
        let config = load_config_from_str(
            r#"
[targets.target1]
roots = "resources"
"#,
        )
        .unwrap();
        let resolved =
            resolve_target(&config, "target1", project.path(), &TargetOverrides::default())
                .unwrap();
        assert_eq!(resolved.name, "target1");
        assert_eq!(resolved.roots.len(), 1);
        assert_eq!(resolved.roots[0].path, project.path().join("resources"));
        assert_eq!(resolved.roots[0].prefix, "resources");
        assert_eq!(resolved.out_dir, project.path().join("target/resembed"));
        assert_eq!(
            resolved.target_dir(),
            project.path().join("target/resembed/target1")
        );
        assert_eq!(resolved.chunk_size, 8 * 1024 * 1024);
        assert_eq!(resolved.mount, "crate::target1");
    }

    #[test]
    fn unknown_target_errors() {
        let project = project_with_dirs(&[]);
        let config = load_config_from_str("").unwrap();
        let err = resolve_target(
            &config,
            "nonexistent",
            project.path(),
            &TargetOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTarget(_)));
    }

    #[test]
    fn missing_root_errors() {
        let project = project_with_dirs(&[]);
        let config = load_config_from_str(
            r#"
[targets.target1]
roots = "resources"
"#,
        )
        .unwrap();
        let err = resolve_target(&config, "target1", project.path(), &TargetOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRoot { ref target, .. } if target == "target1"));
    }

    #[test]
    fn explicit_prefix_and_nested_root() {
        let project = project_with_dirs(&["target2/resources"]);
        let config = load_config_from_str(
            r#"
[[targets.target2.roots]]
path = "target2/resources"
prefix = "assets/v2"
"#,
        )
        .unwrap();
        let resolved =
            resolve_target(&config, "target2", project.path(), &TargetOverrides::default())
                .unwrap();
        assert_eq!(resolved.roots[0].prefix, "assets/v2");
    }

    #[test]
    fn target_overrides_global_settings() {
        let project = project_with_dirs(&["res"]);
        let config = load_config_from_str(
            r#"
[generate]
out_dir = "gen"
chunk_size = "1MiB"
jobs = 2

[targets.a]
roots = "res"
out_dir = "gen-a"
chunk_size = 512
mount = "crate::embedded::a"
"#,
        )
        .unwrap();
        let resolved =
            resolve_target(&config, "a", project.path(), &TargetOverrides::default()).unwrap();
        assert_eq!(resolved.out_dir, project.path().join("gen-a"));
        assert_eq!(resolved.chunk_size, 512);
        assert_eq!(resolved.mount, "crate::embedded::a");
        assert_eq!(resolved.jobs, Some(2));
    }

    #[test]
    fn cli_overrides_replace_roots_and_out_dir() {
        let project = project_with_dirs(&["res", "other/assets"]);
        let config = load_config_from_str(
            r#"
[targets.a]
roots = "res"
out_dir = "gen-a"
"#,
        )
        .unwrap();
        let overrides = TargetOverrides {
            roots: vec![PathBuf::from("other/assets")],
            out_dir: Some(PathBuf::from("cli-out")),
        };
        let resolved = resolve_target(&config, "a", project.path(), &overrides).unwrap();
        assert_eq!(resolved.roots.len(), 1);
        assert_eq!(resolved.roots[0].path, project.path().join("other/assets"));
        assert_eq!(resolved.roots[0].prefix, "assets");
        assert_eq!(resolved.out_dir, project.path().join("cli-out"));
    }

    #[test]
    fn default_prefix_rules() {
        assert_eq!(default_prefix(Path::new("resources")), "resources");
        assert_eq!(default_prefix(Path::new("a/b/static/")), "static");
        assert_eq!(default_prefix(Path::new(".")), "");
        assert_eq!(default_prefix(Path::new("/")), "");
    }

    #[test]
    fn out_dir_resolves_without_roots() {
        let project = tempfile::tempdir().unwrap();
        let config = load_config_from_str(
            "[targets.target1]\nroots = [\"missing\"]\nout_dir = \"gen/t1\"\n",
        )
        .unwrap();
        let dir = resolve_out_dir(&config, "target1", project.path(), &TargetOverrides::default())
            .unwrap();
        assert_eq!(dir, project.path().join("gen/t1"));
        assert!(resolve_out_dir(&config, "nope", project.path(), &TargetOverrides::default()).is_err());
    }

    #[test]
    fn root_inside_out_dir_is_rejected() {
        let project = project_with_dirs(&["gen/target1/src"]);
        let config = load_config_from_str(
            "[generate]\nout_dir = \"gen\"\n\n[targets.target1]\nroots = \"gen/target1/src\"\n",
        )
        .unwrap();
        let err = resolve_target(&config, "target1", project.path(), &TargetOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::RootInOutDir { ref target, .. } if target == "target1"));

        let err = resolve_out_dir(&config, "target1", project.path(), &TargetOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::RootInOutDir { .. }));
    }

    #[test]
    fn root_equal_to_out_dir_is_rejected() {
        let project = project_with_dirs(&["assets"]);
        let config =
            load_config_from_str("[targets.t]\nroots = \"assets\"\nout_dir = \"./assets\"\n").unwrap();
        let err =
            resolve_target(&config, "t", project.path(), &TargetOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::RootInOutDir { .. }));
    }

    #[test]
    fn out_dir_inside_root_is_allowed() {
        let project = project_with_dirs(&["assets"]);
        let config =
            load_config_from_str("[targets.t]\nroots = \"assets\"\nout_dir = \"assets/gen\"\n").unwrap();
        let resolved =
            resolve_target(&config, "t", project.path(), &TargetOverrides::default()).unwrap();
        assert_eq!(resolved.out_dir, project.path().join("assets/gen"));
    }

    #[test]
    fn normalize_path_handles_missing_tails() {
        let project = project_with_dirs(&["a"]);
        let base = project.path().canonicalize().unwrap();
        assert_eq!(normalize_path(&project.path().join("a")), base.join("a"));
        assert_eq!(normalize_path(&project.path().join("a/b/c")), base.join("a/b/c"));
        assert_eq!(normalize_path(&project.path().join("./a/x")), base.join("a/x"));
    }
}
