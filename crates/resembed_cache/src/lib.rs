//! Incremental build state for resource embedding.
//!
//! This crate persists a per-target [`GenerationRecord`] of fingerprints,
//! stores generated blob units with a validated header, and provides the
//! [`IncrementalGate`] that decides which resources must be regenerated.
//! Every read is fail-safe: a missing, corrupt, or incompatible record
//! degrades to regenerating everything.

#![warn(missing_docs)]

pub mod changes;
pub mod error;
pub mod gate;
pub mod record;
pub mod unit;

pub use changes::{detect_changes, ChangeSet, Observed};
pub use error::CacheError;
pub use gate::{GateSummary, IncrementalGate};
pub use record::{GenerationRecord, RecordEntry, RECORD_FILE, RECORD_SCHEMA_VERSION};
pub use unit::{unit_key, UnitHeader, UnitStore, BLOBS_SUBDIR};
