//! Error types for incremental state and blob unit operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing incremental build state.
///
/// Record problems are recovered by the gate (full regeneration); unit
/// verification failures are surfaced by the generator as fatal errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing state files.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The generation record could not be parsed as valid JSON.
    #[error("failed to parse generation record {}: {reason}", path.display())]
    RecordParse {
        /// The record file path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A unit header is missing, truncated, or has the wrong magic bytes.
    #[error("invalid unit header in {}: {reason}", path.display())]
    InvalidHeader {
        /// The header file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The unit format version does not match the current version.
    #[error("version mismatch in {}: expected {expected}, got {actual}", path.display())]
    VersionMismatch {
        /// The header file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The actual format version found in the file.
        actual: u32,
    },

    /// The fingerprint of the stored bytes differs from the expected one.
    #[error("fingerprint mismatch in {}: expected {expected}, got {actual}", path.display())]
    FingerprintMismatch {
        /// The unit header path.
        path: PathBuf,
        /// The expected fingerprint.
        expected: String,
        /// The fingerprint computed from the stored chunks.
        actual: String,
    },

    /// The stored byte length or chunk layout differs from the expected one.
    #[error("length mismatch in {}: expected {expected} bytes, got {actual}", path.display())]
    LengthMismatch {
        /// The unit header path.
        path: PathBuf,
        /// The expected byte length.
        expected: u64,
        /// The length found on disk.
        actual: u64,
    },

    /// A resource needs more chunks than a unit header can describe.
    #[error("{len} bytes at chunk size {chunk_size} exceed the maximum chunk count")]
    TooManyChunks {
        /// Length of the resource in bytes.
        len: u64,
        /// The configured chunk size.
        chunk_size: u64,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
