//! Blob unit generation.
//!
//! Copies one resource into its unit: raw chunk files first, then the
//! header. The unit is re-read and checked against the scan before it is
//! accepted. Each resource writes only files named after its own unit key,
//! so generation of distinct resources can run concurrently.

use std::fs::File;
use std::io::Read;

use resembed_cache::{unit_key, RecordEntry, UnitHeader, UnitStore};
use resembed_common::Fingerprinter;

use crate::error::GenerateError;
use crate::scanner::ResourceRecord;

/// Generates and verifies the unit of one resource.
///
/// Returns the record entry describing the verified unit. Any mismatch
/// between the written unit and `resource` (for example because the file
/// changed after it was scanned) is a [`GenerateError::Verification`].
pub fn generate_blob(
    store: &UnitStore,
    target: &str,
    resource: &ResourceRecord,
    chunk_size: u64,
    tool_version: &str,
) -> Result<RecordEntry, GenerateError> {
    let key = unit_key(&resource.path);
    let chunks = UnitHeader::chunk_count(resource.len, chunk_size)?;
    store.remove_unit(&key)?;

    let unreadable = |source: std::io::Error| GenerateError::Unreadable {
        path: resource.source.clone(),
        source,
    };
    let mut file = File::open(&resource.source).map_err(unreadable)?;
    let mut fingerprinter = Fingerprinter::new();

    for index in 0..chunks {
        let remaining = resource.len.saturating_sub(fingerprinter.len());
        let mut buf = Vec::with_capacity(remaining.min(chunk_size) as usize);
        (&mut file)
            .take(chunk_size)
            .read_to_end(&mut buf)
            .map_err(unreadable)?;
        store.write_chunk(&key, index, &buf)?;
        fingerprinter.update(&buf);
    }

    let header = UnitHeader::new(
        tool_version,
        fingerprinter.len(),
        chunk_size,
        fingerprinter.finish(),
    )?;
    store.write_header(&key, &header)?;

    let verified = store
        .verify(&key, resource.len, resource.fingerprint)
        .map_err(|source| GenerateError::Verification {
            target: target.to_string(),
            path: resource.path.clone(),
            source,
        })?;

    tracing::debug!(
        target_name = target,
        path = %resource.path,
        len = resource.len,
        chunks = verified.chunks,
        "generated blob unit"
    );

    Ok(RecordEntry {
        fingerprint: resource.fingerprint,
        len: resource.len,
        unit_key: key,
        chunks: verified.chunks,
        chunk_size,
    })
}
