//! Build-script entry point.
//!
//! ```ignore
//! // build.rs
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     resembed_gen::Embed::new("target1").root("resources").build()?;
//!     Ok(())
//! }
//! ```
//!
//! By default roots are relative to `CARGO_MANIFEST_DIR` and output goes to
//! `$OUT_DIR/resembed`, which is where `resembed::include_target!` looks.

use std::path::{Path, PathBuf};

use resembed_config::{
    check_out_dir, default_prefix, is_valid_target_name, load_config, resolve_target, ConfigError,
    ResolvedRoot, ResolvedTarget, TargetOverrides, DEFAULT_CHUNK_SIZE,
};

use crate::error::GenerateError;
use crate::pipeline::{generate_target, GenerateOptions, GenerationReport};

/// Subdirectory of `OUT_DIR` that receives generated targets.
pub const OUT_SUBDIR: &str = "resembed";

/// Builder that generates one target from a build script.
#[derive(Debug, Clone)]
pub struct Embed {
    target: String,
    roots: Vec<(PathBuf, Option<String>)>,
    include: Vec<String>,
    exclude: Vec<String>,
    chunk_size: u64,
    out_dir: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    mount: Option<String>,
    jobs: Option<usize>,
    cargo_directives: bool,
}

impl Embed {
    /// Starts configuring target `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            roots: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE.bytes(),
            out_dir: None,
            base_dir: None,
            mount: None,
            jobs: None,
            cargo_directives: true,
        }
    }

    /// Adds a root mounted under its final path component.
    pub fn root(mut self, path: impl AsRef<Path>) -> Self {
        self.roots.push((path.as_ref().to_path_buf(), None));
        self
    }

    /// Adds a root mounted under `prefix` (empty for the top level).
    pub fn root_with_prefix(mut self, path: impl AsRef<Path>, prefix: impl Into<String>) -> Self {
        self.roots
            .push((path.as_ref().to_path_buf(), Some(prefix.into())));
        self
    }

    /// Adds an include glob.
    pub fn include(mut self, glob: impl Into<String>) -> Self {
        self.include.push(glob.into());
        self
    }

    /// Adds an exclude glob.
    pub fn exclude(mut self, glob: impl Into<String>) -> Self {
        self.exclude.push(glob.into());
        self
    }

    /// Sets the maximum bytes per chunk.
    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Sets the base output directory instead of `$OUT_DIR/resembed`.
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets the directory relative roots are resolved against instead of
    /// `CARGO_MANIFEST_DIR`.
    pub fn base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets the module path the manifest is included at (default `crate::<target>`).
    pub fn mount(mut self, path: impl Into<String>) -> Self {
        self.mount = Some(path.into());
        self
    }

    /// Sets the number of worker threads.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Enables or disables `cargo:` directives on stdout (enabled by default).
    pub fn cargo_directives(mut self, enabled: bool) -> Self {
        self.cargo_directives = enabled;
        self
    }

    /// Resolves the builder into a target without generating anything.
    pub fn resolve(&self) -> Result<ResolvedTarget, GenerateError> {
        if !is_valid_target_name(&self.target) {
            return Err(ConfigError::InvalidTargetName(self.target.clone()).into());
        }
        if self.roots.is_empty() {
            return Err(ConfigError::MissingField(format!("roots of target '{}'", self.target)).into());
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationError("chunk_size must be greater than zero".into()).into());
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::ValidationError("jobs must be greater than zero".into()).into());
        }

        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => env_dir("CARGO_MANIFEST_DIR")?,
        };
        let out_dir = match &self.out_dir {
            Some(dir) => base.join(dir),
            None => env_dir("OUT_DIR")?.join(OUT_SUBDIR),
        };
        let roots: Vec<ResolvedRoot> = self
            .roots
            .iter()
            .map(|(path, prefix)| ResolvedRoot {
                path: base.join(path),
                prefix: prefix.clone().unwrap_or_else(|| default_prefix(path)),
            })
            .collect();
        check_out_dir(&self.target, &roots, &out_dir)?;

        Ok(ResolvedTarget {
            name: self.target.clone(),
            roots,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            out_dir,
            chunk_size: self.chunk_size,
            mount: self
                .mount
                .clone()
                .unwrap_or_else(|| format!("crate::{}", self.target)),
            jobs: self.jobs,
        })
    }

    /// Generates the target.
    pub fn build(self) -> Result<GenerationReport, GenerateError> {
        let target = self.resolve()?;
        run(&target, self.cargo_directives)
    }

    /// Generates `target` as described in `<project_dir>/resembed.toml`.
    ///
    /// The configured output directory is replaced by `$OUT_DIR/resembed` so
    /// the manifest can be found by `resembed::include_target!`.
    pub fn from_config(project_dir: &Path, target: &str) -> Result<GenerationReport, GenerateError> {
        let config = load_config(project_dir)?;
        let overrides = TargetOverrides {
            roots: Vec::new(),
            out_dir: Some(env_dir("OUT_DIR")?.join(OUT_SUBDIR)),
        };
        let resolved = resolve_target(&config, target, project_dir, &overrides)?;
        println!(
            "cargo:rerun-if-changed={}",
            project_dir.join(resembed_config::CONFIG_FILE).display()
        );
        run(&resolved, true)
    }
}

fn run(target: &ResolvedTarget, cargo_directives: bool) -> Result<GenerationReport, GenerateError> {
    if cargo_directives {
        for root in &target.roots {
            println!("cargo:rerun-if-changed={}", root.path.display());
        }
    }
    let report = generate_target(target, &GenerateOptions::default())?;
    if cargo_directives {
        for source in &report.sources {
            println!("cargo:rerun-if-changed={}", source.display());
        }
    }
    Ok(report)
}

fn env_dir(name: &'static str) -> Result<PathBuf, GenerateError> {
    std::env::var_os(name)
        .map(PathBuf::from)
        .ok_or(GenerateError::MissingEnv(name))
}
