//! The persisted generation record for one target.
//!
//! The record is stored as `record.json` in the target's output directory. It
//! maps every virtual path generated by the last successful run to the
//! fingerprint and unit it was generated from, so the next run can skip
//! resources whose content has not changed.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use resembed_common::{Fingerprint, VirtualPath};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the record file within a target's output directory.
pub const RECORD_FILE: &str = "record.json";

/// Current record schema version. Increment on breaking changes to the layout.
pub const RECORD_SCHEMA_VERSION: u32 = 1;

/// Incremental state for one target, written after each successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Layout version of this file.
    pub schema_version: u32,

    /// Tool version that produced the record. Invalidate on version change.
    pub tool_version: String,

    /// The target this record belongs to.
    pub target: String,

    /// Per-resource state, keyed and ordered by virtual path.
    pub entries: BTreeMap<VirtualPath, RecordEntry>,
}

/// Recorded state of one generated resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Fingerprint of the resource when its unit was generated.
    pub fingerprint: Fingerprint,

    /// Byte length of the resource.
    pub len: u64,

    /// Key of the generated unit in the target's `blobs/` directory.
    pub unit_key: String,

    /// Number of chunk files the unit was split into.
    pub chunks: u32,

    /// Chunk size the unit was generated with.
    pub chunk_size: u64,
}

impl GenerationRecord {
    /// Creates a new, empty record for the given target and tool version.
    pub fn new(target: &str, tool_version: &str) -> Self {
        Self {
            schema_version: RECORD_SCHEMA_VERSION,
            tool_version: tool_version.to_string(),
            target: target.to_string(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads the record from a target directory.
    ///
    /// Returns `Ok(None)` when no record exists yet and an error when the
    /// file exists but cannot be read or parsed.
    pub fn load(target_dir: &Path) -> Result<Option<Self>, CacheError> {
        let path = target_dir.join(RECORD_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::RecordParse {
                path,
                reason: e.to_string(),
            })
    }

    /// Saves the record to a target directory.
    ///
    /// The JSON is written to a temporary file in the same directory and
    /// renamed over `record.json`, so a concurrent reader sees either the old
    /// or the new record, never a partial one.
    pub fn save(&self, target_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(target_dir).map_err(|e| CacheError::Io {
            path: target_dir.to_path_buf(),
            source: e,
        })?;
        let path = target_dir.join(RECORD_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(target_dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Returns `true` if this record can be trusted by the given tool for the given target.
    pub fn is_compatible(&self, tool_version: &str, target: &str) -> bool {
        self.schema_version == RECORD_SCHEMA_VERSION
            && self.tool_version == tool_version
            && self.target == target
    }

    /// Drops entries whose virtual path is not in `live`, returning them.
    pub fn prune<'a>(
        &mut self,
        live: impl IntoIterator<Item = &'a VirtualPath>,
    ) -> Vec<(VirtualPath, RecordEntry)> {
        let live: std::collections::BTreeSet<&VirtualPath> = live.into_iter().collect();
        let stale: Vec<VirtualPath> = self
            .entries
            .keys()
            .filter(|p| !live.contains(p))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter_map(|p| self.entries.remove(&p).map(|e| (p, e)))
            .collect()
    }
}
