//! Storage of generated blob units.
//!
//! Each resource is stored under `<target_dir>/blobs/` as one or more raw
//! chunk files (`<key>.<n>.bin`, directly includable by the compiler) and a
//! header file (`<key>.meta`) carrying magic bytes, format version, declared
//! length, chunk layout and fingerprint. The header is written last, so a
//! unit whose header validates is complete.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use resembed_common::{Fingerprint, Fingerprinter, VirtualPath};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Subdirectory of a target directory holding blob units.
pub const BLOBS_SUBDIR: &str = "blobs";

/// Magic bytes identifying a resembed unit header.
const UNIT_MAGIC: [u8; 4] = *b"RSMB";

/// Current unit format version. Increment on breaking changes to the header
/// or chunk layout.
const UNIT_FORMAT_VERSION: u32 = 1;

const CHUNK_EXT: &str = "bin";
const HEADER_EXT: &str = "meta";

/// Returns the unit key for a virtual path.
///
/// The key depends only on the path, so a resource keeps the same unit files
/// when its content changes and the old unit is overwritten in place.
pub fn unit_key(path: &VirtualPath) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(path.as_str().as_bytes()))
}

/// Header stored next to every unit for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitHeader {
    /// Magic bytes: must be `b"RSMB"`.
    pub magic: [u8; 4],

    /// Unit format version.
    pub format_version: u32,

    /// Tool version that produced the unit.
    pub tool_version: String,

    /// Total byte length across all chunks.
    pub len: u64,

    /// Maximum bytes per chunk.
    pub chunk_size: u64,

    /// Number of chunk files.
    pub chunks: u32,

    /// Fingerprint of the concatenated chunks.
    pub fingerprint: Fingerprint,
}

impl UnitHeader {
    /// Creates a header for a resource of `len` bytes split at `chunk_size`.
    pub fn new(
        tool_version: &str,
        len: u64,
        chunk_size: u64,
        fingerprint: Fingerprint,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            magic: UNIT_MAGIC,
            format_version: UNIT_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
            len,
            chunk_size,
            chunks: Self::chunk_count(len, chunk_size)?,
            fingerprint,
        })
    }

    /// Number of chunks a resource of `len` bytes is split into.
    ///
    /// Always at least one, so an empty resource still has a unit to include.
    /// Fails if the count does not fit the header's `u32`.
    pub fn chunk_count(len: u64, chunk_size: u64) -> Result<u32, CacheError> {
        let chunk_size = chunk_size.max(1);
        u32::try_from(len.div_ceil(chunk_size).max(1))
            .map_err(|_| CacheError::TooManyChunks { len, chunk_size })
    }

    /// Expected byte length of chunk `index`.
    pub fn chunk_len(&self, index: u32) -> u64 {
        let start = u64::from(index) * self.chunk_size;
        self.len.saturating_sub(start).min(self.chunk_size)
    }
}

/// Directory of blob units for one target.
#[derive(Debug, Clone)]
pub struct UnitStore {
    dir: PathBuf,
}

impl UnitStore {
    /// Creates a store for the target whose output directory is `target_dir`.
    pub fn new(target_dir: &Path) -> Self {
        Self {
            dir: target_dir.join(BLOBS_SUBDIR),
        }
    }

    /// Returns the `blobs/` directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensures the `blobs/` directory exists.
    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })
    }

    /// File name of chunk `index` of unit `key`.
    pub fn chunk_file_name(key: &str, index: u32) -> String {
        format!("{key}.{index}.{CHUNK_EXT}")
    }

    /// Path of chunk `index` of unit `key`.
    pub fn chunk_path(&self, key: &str, index: u32) -> PathBuf {
        self.dir.join(Self::chunk_file_name(key, index))
    }

    /// Path of the header file of unit `key`.
    pub fn header_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{HEADER_EXT}"))
    }

    /// Removes the header and every chunk of unit `key`. Returns the number of files removed.
    ///
    /// Chunks are written in index order, so removal stops at the first
    /// missing index.
    pub fn remove_unit(&self, key: &str) -> Result<usize, CacheError> {
        let mut removed = usize::from(remove_if_present(&self.header_path(key))?);
        let mut index = 0;
        while remove_if_present(&self.chunk_path(key, index))? {
            removed += 1;
            index += 1;
        }
        Ok(removed)
    }

    /// Writes one chunk of unit `key`.
    pub fn write_chunk(&self, key: &str, index: u32, data: &[u8]) -> Result<(), CacheError> {
        let path = self.chunk_path(key, index);
        std::fs::write(&path, data).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Writes the header of unit `key`. Call after every chunk has been written.
    pub fn write_header(&self, key: &str, header: &UnitHeader) -> Result<(), CacheError> {
        let bytes = bincode::serde::encode_to_vec(header, bincode::config::standard()).map_err(
            |e| CacheError::Serialization {
                reason: e.to_string(),
            },
        )?;
        let path = self.header_path(key);
        std::fs::write(&path, bytes).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Reads and validates the header of unit `key`.
    pub fn read_header(&self, key: &str) -> Result<UnitHeader, CacheError> {
        let path = self.header_path(key);
        let raw = std::fs::read(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;

        let header: UnitHeader = bincode::serde::decode_from_slice(&raw, bincode::config::standard())
            .map_err(|e| CacheError::InvalidHeader {
                path: path.clone(),
                reason: e.to_string(),
            })?
            .0;

        if header.magic != UNIT_MAGIC {
            return Err(CacheError::InvalidHeader {
                path,
                reason: "missing magic bytes".to_string(),
            });
        }
        if header.format_version != UNIT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path,
                expected: UNIT_FORMAT_VERSION,
                actual: header.format_version,
            });
        }
        if UnitHeader::chunk_count(header.len, header.chunk_size).ok() != Some(header.chunks) {
            return Err(CacheError::InvalidHeader {
                path,
                reason: format!(
                    "{} chunks declared for {} bytes at chunk size {}",
                    header.chunks, header.len, header.chunk_size
                ),
            });
        }
        Ok(header)
    }

    /// Re-reads unit `key` in full and checks it against the expected length
    /// and fingerprint.
    ///
    /// Both the declared values in the header and the actual chunk contents
    /// must match. Returns the validated header.
    pub fn verify(
        &self,
        key: &str,
        expected_len: u64,
        expected: Fingerprint,
    ) -> Result<UnitHeader, CacheError> {
        let header = self.read_header(key)?;
        let header_path = self.header_path(key);

        if header.len != expected_len {
            return Err(CacheError::LengthMismatch {
                path: header_path,
                expected: expected_len,
                actual: header.len,
            });
        }
        if header.fingerprint != expected {
            return Err(CacheError::FingerprintMismatch {
                path: header_path,
                expected: expected.to_string(),
                actual: header.fingerprint.to_string(),
            });
        }

        let mut fingerprinter = Fingerprinter::new();
        for index in 0..header.chunks {
            let path = self.chunk_path(key, index);
            let data = std::fs::read(&path).map_err(|e| CacheError::Io {
                path: path.clone(),
                source: e,
            })?;
            if data.len() as u64 != header.chunk_len(index) {
                return Err(CacheError::LengthMismatch {
                    path,
                    expected: header.chunk_len(index),
                    actual: data.len() as u64,
                });
            }
            fingerprinter.update(&data);
        }

        if fingerprinter.len() != expected_len {
            return Err(CacheError::LengthMismatch {
                path: header_path,
                expected: expected_len,
                actual: fingerprinter.len(),
            });
        }
        let actual = fingerprinter.finish();
        if actual != expected {
            return Err(CacheError::FingerprintMismatch {
                path: header_path,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(header)
    }

    /// Cheap presence check used by the incremental gate.
    ///
    /// Returns `true` if the header validates, declares the expected
    /// fingerprint, length and chunk size, and every chunk file exists with
    /// the right size. Chunk contents are not re-hashed.
    pub fn is_present(
        &self,
        key: &str,
        expected_len: u64,
        expected: Fingerprint,
        chunk_size: u64,
    ) -> bool {
        let Ok(header) = self.read_header(key) else {
            return false;
        };
        if header.len != expected_len
            || header.fingerprint != expected
            || header.chunk_size != chunk_size
        {
            return false;
        }
        (0..header.chunks).all(|index| {
            std::fs::metadata(self.chunk_path(key, index))
                .is_ok_and(|m| m.is_file() && m.len() == header.chunk_len(index))
        })
    }

    /// Removes every unit whose key is not in `live_keys`.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self, live_keys: &HashSet<&str>) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for path in self.list_files()? {
            match key_of(&path) {
                Some(key) if live_keys.contains(key) => {}
                _ => {
                    remove_file(&path)?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn list_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Extracts the unit key from a unit file name (`<key>.meta` or `<key>.<n>.bin`).
fn key_of(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let (key, rest) = name.split_once('.')?;
    let is_unit_file = rest == HEADER_EXT
        || rest
            .strip_suffix(CHUNK_EXT)
            .and_then(|index| index.strip_suffix('.'))
            .is_some_and(|index| index.parse::<u32>().is_ok());
    is_unit_file.then_some(key)
}

/// Removes `path`, returning `false` if it did not exist.
fn remove_if_present(path: &Path) -> Result<bool, CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn remove_file(path: &Path) -> Result<(), CacheError> {
    std::fs::remove_file(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, UnitStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UnitStore::new(dir.path());
        store.ensure_dir().unwrap();
        (dir, store)
    }

    fn write_unit(store: &UnitStore, key: &str, data: &[u8], chunk_size: u64) -> UnitHeader {
        let header =
            UnitHeader::new("0.1.0", data.len() as u64, chunk_size, Fingerprint::from_bytes(data))
                .unwrap();
        let mut pieces: Vec<&[u8]> = data.chunks(chunk_size as usize).collect();
        if pieces.is_empty() {
            pieces.push(&[]);
        }
        for (i, piece) in pieces.iter().enumerate() {
            store.write_chunk(key, i as u32, piece).unwrap();
        }
        store.write_header(key, &header).unwrap();
        header
    }

    #[test]
    fn unit_key_is_stable_and_path_specific() {
        let a = VirtualPath::parse("resources/message.txt").unwrap();
        let b = VirtualPath::parse("resources/FirstFolder/config.json").unwrap();
        assert_eq!(unit_key(&a), unit_key(&a));
        assert_ne!(unit_key(&a), unit_key(&b));
        assert_eq!(unit_key(&a).len(), 16);
    }

    #[test]
    fn chunk_count_rules() {
        assert_eq!(UnitHeader::chunk_count(0, 4).unwrap(), 1);
        assert_eq!(UnitHeader::chunk_count(4, 4).unwrap(), 1);
        assert_eq!(UnitHeader::chunk_count(5, 4).unwrap(), 2);
        assert_eq!(UnitHeader::chunk_count(11, 4).unwrap(), 3);
    }

    #[test]
    fn chunk_count_overflow_is_an_error() {
        let len = u64::from(u32::MAX) + 1;
        assert_eq!(UnitHeader::chunk_count(len - 1, 1).unwrap(), u32::MAX);
        let err = UnitHeader::chunk_count(len, 1).unwrap_err();
        assert!(matches!(err, CacheError::TooManyChunks { chunk_size: 1, .. }));
        assert!(UnitHeader::new("0.1.0", 5_000_000_000, 1, Fingerprint::from_bytes(b"")).is_err());
    }

    #[test]
    fn chunk_len_of_last_chunk() {
        let h = UnitHeader::new("0.1.0", 11, 4, Fingerprint::from_bytes(b"hello world")).unwrap();
        assert_eq!(h.chunk_len(0), 4);
        assert_eq!(h.chunk_len(1), 4);
        assert_eq!(h.chunk_len(2), 3);
    }

    #[test]
    fn write_then_verify() {
        let (_dir, store) = make_store();
        let data = b"hello world";
        write_unit(&store, "k1", data, 4);
        let header = store
            .verify("k1", data.len() as u64, Fingerprint::from_bytes(data))
            .unwrap();
        assert_eq!(header.chunks, 3);
    }

    #[test]
    fn verify_empty_unit() {
        let (_dir, store) = make_store();
        write_unit(&store, "empty", b"", 4);
        assert!(store.verify("empty", 0, Fingerprint::from_bytes(b"")).is_ok());
    }

    #[test]
    fn verify_detects_truncated_chunk() {
        let (_dir, store) = make_store();
        let data = b"hello world";
        write_unit(&store, "k1", data, 4);
        std::fs::write(store.chunk_path("k1", 2), b"rl").unwrap();
        let err = store
            .verify("k1", data.len() as u64, Fingerprint::from_bytes(data))
            .unwrap_err();
        assert!(matches!(err, CacheError::LengthMismatch { .. }));
    }

    #[test]
    fn verify_detects_corrupted_chunk() {
        let (_dir, store) = make_store();
        let data = b"hello world";
        write_unit(&store, "k1", data, 4);
        std::fs::write(store.chunk_path("k1", 0), b"HELL").unwrap();
        let err = store
            .verify("k1", data.len() as u64, Fingerprint::from_bytes(data))
            .unwrap_err();
        assert!(matches!(err, CacheError::FingerprintMismatch { .. }));
    }

    #[test]
    fn verify_detects_wrong_declared_fingerprint() {
        let (_dir, store) = make_store();
        write_unit(&store, "k1", b"hello world", 64);
        let err = store
            .verify("k1", 11, Fingerprint::from_bytes(b"hello worle"))
            .unwrap_err();
        assert!(matches!(err, CacheError::FingerprintMismatch { .. }));
    }

    #[test]
    fn read_header_rejects_garbage() {
        let (_dir, store) = make_store();
        std::fs::write(store.header_path("bad"), b"not a header").unwrap();
        assert!(store.read_header("bad").is_err());
    }

    #[test]
    fn read_header_rejects_wrong_magic() {
        let (_dir, store) = make_store();
        let mut header = UnitHeader::new("0.1.0", 1, 4, Fingerprint::from_bytes(b"x")).unwrap();
        header.magic = *b"NOPE";
        store.write_header("k", &header).unwrap();
        let err = store.read_header("k").unwrap_err();
        assert!(matches!(err, CacheError::InvalidHeader { .. }));
    }

    #[test]
    fn read_header_rejects_future_version() {
        let (_dir, store) = make_store();
        let mut header = UnitHeader::new("0.1.0", 1, 4, Fingerprint::from_bytes(b"x")).unwrap();
        header.format_version = UNIT_FORMAT_VERSION + 1;
        store.write_header("k", &header).unwrap();
        let err = store.read_header("k").unwrap_err();
        assert!(matches!(err, CacheError::VersionMismatch { .. }));
    }

    #[test]
    fn is_present_checks_header_and_chunks() {
        let (_dir, store) = make_store();
        let data = b"hello world";
        let fp = Fingerprint::from_bytes(data);
        write_unit(&store, "k1", data, 4);
        assert!(store.is_present("k1", 11, fp, 4));
        assert!(!store.is_present("k1", 11, fp, 8), "chunk size changed");
        assert!(!store.is_present("k1", 11, Fingerprint::from_bytes(b"other"), 4));

        std::fs::remove_file(store.chunk_path("k1", 1)).unwrap();
        assert!(!store.is_present("k1", 11, fp, 4));
    }

    #[test]
    fn is_present_false_without_header() {
        let (_dir, store) = make_store();
        store.write_chunk("k1", 0, b"data").unwrap();
        assert!(!store.is_present("k1", 4, Fingerprint::from_bytes(b"data"), 4));
    }

    #[test]
    fn remove_unit_deletes_all_files() {
        let (_dir, store) = make_store();
        write_unit(&store, "k1", b"hello world", 4);
        write_unit(&store, "k2", b"other", 4);
        assert_eq!(store.remove_unit("k1").unwrap(), 4);
        assert!(!store.header_path("k1").exists());
        assert!(!store.chunk_path("k1", 2).exists());
        assert!(store.header_path("k2").exists());
        assert!(store.chunk_path("k2", 1).exists());
    }

    #[test]
    fn remove_unit_handles_partial_units() {
        let (_dir, store) = make_store();
        store.write_chunk("k1", 0, b"hell").unwrap();
        store.write_chunk("k1", 1, b"o wo").unwrap();
        assert_eq!(store.remove_unit("k1").unwrap(), 2);
        assert_eq!(store.remove_unit("k1").unwrap(), 0);

        let missing = UnitStore::new(&store.dir().join("nope"));
        assert_eq!(missing.remove_unit("k1").unwrap(), 0);
    }

    #[test]
    fn gc_removes_dead_units() {
        let (_dir, store) = make_store();
        write_unit(&store, "live", b"keep me", 64);
        write_unit(&store, "dead", b"remove me", 4);
        std::fs::write(store.dir().join("stray.txt"), b"?").unwrap();

        let live: HashSet<&str> = ["live"].into_iter().collect();
        let removed = store.gc(&live).unwrap();
        // 3 chunks and the header of "dead", plus the stray file
        assert_eq!(removed, 5);
        assert!(store.header_path("live").exists());
        assert!(!store.header_path("dead").exists());
    }

    #[test]
    fn gc_on_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = UnitStore::new(&dir.path().join("nope"));
        assert_eq!(store.gc(&HashSet::new()).unwrap(), 0);
    }

    #[test]
    fn key_of_recognizes_unit_files() {
        assert_eq!(key_of(Path::new("/x/abc.meta")), Some("abc"));
        assert_eq!(key_of(Path::new("/x/abc.3.bin")), Some("abc"));
        assert_eq!(key_of(Path::new("/x/abc.bin")), None);
        assert_eq!(key_of(Path::new("/x/abc.x.bin")), None);
        assert_eq!(key_of(Path::new("/x/readme")), None);
    }
}
