//! The per-target generation pipeline.
//!
//! scan → gate → parallel blob generation → barrier → manifest → commit.
//! A target is published only when every step succeeds: the previous
//! manifest is removed before any unit is rewritten and the new one is
//! written after all units are verified.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use resembed_cache::{unit_key, IncrementalGate, Observed, RecordEntry};
use resembed_common::VirtualPath;
use resembed_config::ResolvedTarget;

use crate::blob::generate_blob;
use crate::error::GenerateError;
use crate::manifest::{manifest_path, remove_manifest, render_manifest, write_if_changed, ManifestSpec};
use crate::scanner::{scan_target, ResourceRecord};

/// Version recorded in units and records. Changing it invalidates both.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Version stamped into the record; a different version forces regeneration.
    pub tool_version: String,
    /// Ignore the previous record and regenerate every resource.
    pub force: bool,
    /// Worker threads; `None` uses rayon's global pool.
    pub jobs: Option<usize>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            tool_version: TOOL_VERSION.to_string(),
            force: false,
            jobs: None,
        }
    }
}

/// Outcome of generating one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// The target name.
    pub target: String,
    /// Resources in the target's manifest.
    pub resources: usize,
    /// Resources whose unit was (re)generated.
    pub generated: usize,
    /// Resources whose existing unit was reused.
    pub skipped: usize,
    /// Resources dropped since the previous run.
    pub pruned: usize,
    /// Whether `manifest.rs` was rewritten.
    pub manifest_written: bool,
    /// Path of the target's manifest.
    pub manifest: PathBuf,
    /// Every source file embedded, in manifest order.
    pub sources: Vec<PathBuf>,
}

/// Generates one target.
pub fn generate_target(
    target: &ResolvedTarget,
    options: &GenerateOptions,
) -> Result<GenerationReport, GenerateError> {
    match options.jobs.or(target.jobs) {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| GenerateError::ThreadPool(e.to_string()))?;
            pool.install(|| run(target, options))
        }
        None => run(target, options),
    }
}

fn run(target: &ResolvedTarget, options: &GenerateOptions) -> Result<GenerationReport, GenerateError> {
    let target_dir = target.target_dir();
    let resources = scan_target(target)?;
    check_unit_keys(&target.name, &resources)?;

    let mut gate = if options.force {
        IncrementalGate::fresh(&target_dir, &target.name, &options.tool_version)
    } else {
        IncrementalGate::open(&target_dir, &target.name, &options.tool_version)
    };

    let observed: BTreeMap<VirtualPath, Observed> = resources
        .iter()
        .map(|r| {
            (
                r.path.clone(),
                Observed {
                    fingerprint: r.fingerprint,
                    len: r.len,
                },
            )
        })
        .collect();
    let changes = gate.detect_changes(&observed, target.chunk_size);
    tracing::debug!(
        target_name = %target.name,
        new = changes.new.len(),
        modified = changes.modified.len(),
        missing_units = changes.missing_units.len(),
        deleted = changes.deleted.len(),
        unchanged = changes.unchanged.len(),
        "detected changes"
    );

    if changes.dirty_count() > 0 {
        remove_manifest(&target_dir)?;
    }
    gate.store().ensure_dir()?;

    let by_path: HashMap<&VirtualPath, &ResourceRecord> =
        resources.iter().map(|r| (&r.path, r)).collect();
    let dirty: Vec<&ResourceRecord> = changes
        .dirty()
        .filter_map(|path| by_path.get(path).copied())
        .collect();

    let store = gate.store();
    let generated: Vec<(VirtualPath, RecordEntry)> = dirty
        .par_iter()
        .map(|resource| {
            generate_blob(
                store,
                &target.name,
                resource,
                target.chunk_size,
                &options.tool_version,
            )
            .map(|entry| (resource.path.clone(), entry))
        })
        .collect::<Result<_, GenerateError>>()?;

    let mut entries: BTreeMap<VirtualPath, RecordEntry> = generated.into_iter().collect();
    for path in &changes.unchanged {
        if let Some(entry) = gate.reuse(path) {
            entries.insert(path.clone(), entry.clone());
        }
    }

    let source = render_manifest(
        &ManifestSpec {
            target: &target.name,
            mount: &target.mount,
            tool_version: &options.tool_version,
        },
        &entries,
    );
    let manifest = manifest_path(&target_dir);
    let manifest_written = write_if_changed(&manifest, &source)?;

    for (path, entry) in &entries {
        gate.record(path.clone(), entry.clone());
    }
    let summary = gate.commit()?;

    let report = GenerationReport {
        target: target.name.clone(),
        resources: entries.len(),
        generated: dirty.len(),
        skipped: changes.unchanged.len(),
        pruned: summary.pruned_entries,
        manifest_written,
        manifest,
        sources: resources.into_iter().map(|r| r.source).collect(),
    };
    tracing::info!(
        target_name = %report.target,
        resources = report.resources,
        generated = report.generated,
        skipped = report.skipped,
        pruned = report.pruned,
        removed_files = summary.removed_files,
        "generated target"
    );
    Ok(report)
}

/// Rejects two virtual paths whose unit keys collide.
fn check_unit_keys(target: &str, resources: &[ResourceRecord]) -> Result<(), GenerateError> {
    let mut seen: HashMap<String, &VirtualPath> = HashMap::with_capacity(resources.len());
    for resource in resources {
        let key = unit_key(&resource.path);
        if let Some(first) = seen.insert(key.clone(), &resource.path) {
            return Err(GenerateError::UnitKeyCollision {
                target: target.to_string(),
                key,
                first: first.clone(),
                second: resource.path.clone(),
            });
        }
    }
    Ok(())
}

/// Removes everything generated for a target: units, record and manifest.
///
/// `target_dir` is the target's own directory (`<out_dir>/<name>`). Returns
/// `false` if there was nothing to remove.
pub fn clean_target(name: &str, target_dir: &Path) -> Result<bool, GenerateError> {
    match std::fs::remove_dir_all(target_dir) {
        Ok(()) => {
            tracing::info!(target_name = name, dir = %target_dir.display(), "cleaned target");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(GenerateError::Io {
            path: target_dir.to_path_buf(),
            source,
        }),
    }
}
