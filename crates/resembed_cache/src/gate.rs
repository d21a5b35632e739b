//! The incremental build gate.
//!
//! `IncrementalGate` ties together the generation record, the unit store,
//! and change detection into a single interface for the generation
//! pipeline. It decides which resources must be regenerated, collects the
//! new record entries, and on commit prunes stale state and persists the
//! record. Loading is fail-safe: a missing, corrupt, or incompatible record
//! results in regenerating everything rather than an error.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use resembed_common::VirtualPath;

use crate::changes::{detect_changes, ChangeSet, Observed};
use crate::error::CacheError;
use crate::record::{GenerationRecord, RecordEntry};
use crate::unit::UnitStore;

/// What a commit removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateSummary {
    /// Record entries dropped because their resource disappeared.
    pub pruned_entries: usize,
    /// Unit files deleted because no live resource references them.
    pub removed_files: usize,
}

/// Incremental build gate for one target.
pub struct IncrementalGate {
    /// Directory holding the record, manifest, and `blobs/`.
    target_dir: PathBuf,

    /// Record loaded from the previous run (or empty).
    previous: GenerationRecord,

    /// Record being built for this run.
    next: GenerationRecord,

    /// Unit store for this target.
    store: UnitStore,
}

impl IncrementalGate {
    /// Opens the gate for a target, loading the previous record if it can be trusted.
    ///
    /// A corrupt record, an unknown schema version, a different tool
    /// version, or a record written for another target all degrade to an
    /// empty record with a warning.
    pub fn open(target_dir: &Path, target: &str, tool_version: &str) -> Self {
        let previous = match GenerationRecord::load(target_dir) {
            Ok(Some(record)) if record.is_compatible(tool_version, target) => record,
            Ok(Some(record)) => {
                tracing::warn!(
                    target_name = target,
                    schema_version = record.schema_version,
                    tool_version = %record.tool_version,
                    "generation record is incompatible; regenerating all resources"
                );
                GenerationRecord::new(target, tool_version)
            }
            Ok(None) => GenerationRecord::new(target, tool_version),
            Err(e) => {
                tracing::warn!(
                    target_name = target,
                    error = %e,
                    "generation record is unreadable; regenerating all resources"
                );
                GenerationRecord::new(target, tool_version)
            }
        };
        Self::with_record(target_dir, target, tool_version, previous)
    }

    /// Opens the gate ignoring any previous record, so every resource is regenerated.
    pub fn fresh(target_dir: &Path, target: &str, tool_version: &str) -> Self {
        let previous = GenerationRecord::new(target, tool_version);
        Self::with_record(target_dir, target, tool_version, previous)
    }

    fn with_record(
        target_dir: &Path,
        target: &str,
        tool_version: &str,
        previous: GenerationRecord,
    ) -> Self {
        Self {
            target_dir: target_dir.to_path_buf(),
            previous,
            next: GenerationRecord::new(target, tool_version),
            store: UnitStore::new(target_dir),
        }
    }

    /// Returns the unit store for this target.
    pub fn store(&self) -> &UnitStore {
        &self.store
    }

    /// Returns the record loaded from the previous run.
    pub fn previous(&self) -> &GenerationRecord {
        &self.previous
    }

    /// Detects which resources must be regenerated.
    ///
    /// A resource is skipped only if its fingerprint, length, and chunk size
    /// match the previous record and its unit is still intact on disk.
    pub fn detect_changes(
        &self,
        current: &BTreeMap<VirtualPath, Observed>,
        chunk_size: u64,
    ) -> ChangeSet {
        detect_changes(current, &self.previous, chunk_size, |entry| {
            self.store
                .is_present(&entry.unit_key, entry.len, entry.fingerprint, entry.chunk_size)
        })
    }

    /// Returns the previous entry for a resource the change set marked unchanged.
    pub fn reuse(&self, path: &VirtualPath) -> Option<&RecordEntry> {
        self.previous.entries.get(path)
    }

    /// Records the state of a resource for the next run.
    pub fn record(&mut self, path: VirtualPath, entry: RecordEntry) {
        self.next.entries.insert(path, entry);
    }

    /// Finishes the run: removes units no longer referenced by the new
    /// record and persists it.
    ///
    /// Only call after the manifest for this run has been written.
    pub fn commit(mut self) -> Result<GateSummary, CacheError> {
        let pruned_entries = self
            .previous
            .prune(self.next.entries.keys())
            .len();

        let live: HashSet<&str> = self
            .next
            .entries
            .values()
            .map(|entry| entry.unit_key.as_str())
            .collect();
        let removed_files = self.store.gc(&live)?;

        self.next.save(&self.target_dir)?;

        Ok(GateSummary {
            pruned_entries,
            removed_files,
        })
    }
}
