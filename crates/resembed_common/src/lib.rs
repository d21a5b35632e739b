//! Shared foundational types used across the resembed toolchain.
//!
//! This crate provides content fingerprints, normalized virtual paths, and
//! human-readable byte sizes used by configuration, the generator, and the
//! incremental build gate.

#![warn(missing_docs)]

pub mod hash;
pub mod size;
pub mod vpath;

pub use hash::{Fingerprint, Fingerprinter};
pub use size::{ByteSize, ParseByteSizeError};
pub use vpath::{VirtualPath, VirtualPathError};
