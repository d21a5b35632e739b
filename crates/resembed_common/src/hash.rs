//! Content fingerprints for change detection and blob verification.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content fingerprint computed using XXH3.
///
/// Two resources with the same `Fingerprint` are assumed to have identical
/// content. Used by the incremental build gate to decide whether a blob must
/// be regenerated, and by the blob generator to verify emitted units.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Computes a fingerprint from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_u128(xxhash_rust::xxh3::xxh3_128(data))
    }

    /// Reconstructs a fingerprint from its integer form.
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_le_bytes())
    }

    /// Returns the fingerprint as an integer, the form embedded in generated code.
    pub const fn as_u128(&self) -> u128 {
        u128::from_le_bytes(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental fingerprint computation over data arriving in pieces.
///
/// Feeding the same bytes in any split produces the same [`Fingerprint`] as
/// [`Fingerprint::from_bytes`] over the concatenation, which is what lets the
/// generator verify chunked blobs without reassembling them.
pub struct Fingerprinter {
    state: Xxh3,
    len: u64,
}

impl Fingerprinter {
    /// Creates a fingerprinter with no input.
    pub fn new() -> Self {
        Self {
            state: Xxh3::new(),
            len: 0,
        }
    }

    /// Feeds more bytes into the fingerprint.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
        self.len += data.len() as u64;
    }

    /// Returns the number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if no bytes have been fed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finishes the computation.
    pub fn finish(&self) -> Fingerprint {
        Fingerprint::from_u128(self.state.digest128())
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}
