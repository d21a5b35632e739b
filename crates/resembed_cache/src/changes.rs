//! Change detection between a scan and the persisted generation record.
//!
//! Compares the fingerprints observed by the current scan against the
//! record of the previous run to identify which resources are new,
//! modified, missing their unit, deleted, or unchanged.

use std::collections::BTreeMap;

use resembed_common::{Fingerprint, VirtualPath};

use crate::record::{GenerationRecord, RecordEntry};

/// What the scanner observed for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observed {
    /// Fingerprint of the resource's current content.
    pub fingerprint: Fingerprint,
    /// Current byte length.
    pub len: u64,
}

/// Result of comparing the current scan against the generation record.
///
/// Every list is sorted by virtual path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Resources that are not present in the record.
    pub new: Vec<VirtualPath>,

    /// Resources whose fingerprint, length, or chunk layout differs from the record.
    pub modified: Vec<VirtualPath>,

    /// Resources that are unchanged but whose generated unit is gone or damaged.
    pub missing_units: Vec<VirtualPath>,

    /// Resources present in the record but no longer discovered.
    pub deleted: Vec<VirtualPath>,

    /// Resources whose recorded state matches and whose unit is intact.
    pub unchanged: Vec<VirtualPath>,
}

impl ChangeSet {
    /// Returns `true` if nothing needs to be generated or removed.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty()
            && self.modified.is_empty()
            && self.missing_units.is_empty()
            && self.deleted.is_empty()
    }

    /// Returns the number of resources that need generation.
    pub fn dirty_count(&self) -> usize {
        self.new.len() + self.modified.len() + self.missing_units.len()
    }

    /// Iterates over every resource that needs generation, in path order.
    pub fn dirty(&self) -> impl Iterator<Item = &VirtualPath> {
        let mut dirty: Vec<&VirtualPath> = self
            .new
            .iter()
            .chain(&self.modified)
            .chain(&self.missing_units)
            .collect();
        dirty.sort();
        dirty.into_iter()
    }
}

/// Compares the current scan against the record to detect changes.
///
/// `unit_present` is consulted only for resources whose recorded state
/// matches, and decides whether their previously generated unit can be
/// reused as is.
pub fn detect_changes(
    current: &BTreeMap<VirtualPath, Observed>,
    record: &GenerationRecord,
    chunk_size: u64,
    unit_present: impl Fn(&RecordEntry) -> bool,
) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (path, observed) in current {
        match record.entries.get(path) {
            Some(entry)
                if entry.fingerprint == observed.fingerprint
                    && entry.len == observed.len
                    && entry.chunk_size == chunk_size =>
            {
                if unit_present(entry) {
                    changes.unchanged.push(path.clone());
                } else {
                    changes.missing_units.push(path.clone());
                }
            }
            Some(_) => changes.modified.push(path.clone()),
            None => changes.new.push(path.clone()),
        }
    }

    changes.deleted = record
        .entries
        .keys()
        .filter(|p| !current.contains_key(*p))
        .cloned()
        .collect();

    changes
}
