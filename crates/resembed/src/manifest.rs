//! The per-target index of embedded blobs.

use std::cmp::Ordering;

use crate::Blob;

/// All blobs embedded for one target, sorted by virtual path.
///
/// Generated code builds this as a `static`; the paths are compile-time
/// constants, so [`find`](Self::find) is a binary search over static data.
#[derive(Debug, Clone, Copy)]
pub struct Manifest {
    target: &'static str,
    blobs: &'static [&'static Blob],
}

impl Manifest {
    /// Creates a manifest. `blobs` must be sorted by path.
    #[doc(hidden)]
    pub const fn new(target: &'static str, blobs: &'static [&'static Blob]) -> Self {
        Self { target, blobs }
    }

    /// Name of the target this manifest was generated for.
    pub const fn target(&self) -> &'static str {
        self.target
    }

    /// Number of resources in the target.
    pub const fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if the target has no resources.
    pub const fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Iterates the blobs in path order.
    pub fn iter(&self) -> impl Iterator<Item = &'static Blob> + '_ {
        self.blobs.iter().copied()
    }

    /// Iterates the virtual paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.blobs.iter().map(|b| b.path())
    }

    /// Looks up a blob by virtual path at runtime.
    ///
    /// Prefer the generated `embed!` macro when the path is known at compile
    /// time; this is for paths that come from elsewhere.
    pub fn find(&self, path: &str) -> Option<&'static Blob> {
        self.blobs
            .binary_search_by(|b| b.path().cmp(path))
            .ok()
            .map(|i| self.blobs[i])
    }

    /// Returns `true` if the target contains `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Returns the blob at `index` in path order. Called from generated code
    /// with an index found by [`find_index`].
    #[doc(hidden)]
    pub fn at(&self, index: usize) -> &'static Blob {
        self.blobs[index]
    }
}

/// Finds `path` in a sorted path table by comparing bytes.
///
/// Usable in constant evaluation, which is how generated `embed!` and `has!`
/// resolve literals whose spelling differs from the generated arms (raw
/// strings, escapes).
#[doc(hidden)]
pub const fn find_index(paths: &[&str], path: &str) -> Option<usize> {
    let needle = path.as_bytes();
    let mut lo = 0;
    let mut hi = paths.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match compare_bytes(paths[mid].as_bytes(), needle) {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
            Ordering::Equal => return Some(mid),
        }
    }
    None
}

const fn compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    let mut i = 0;
    while i < a.len() && i < b.len() {
        if a[i] < b[i] {
            return Ordering::Less;
        }
        if a[i] > b[i] {
            return Ordering::Greater;
        }
        i += 1;
    }
    if a.len() < b.len() {
        Ordering::Less
    } else if a.len() > b.len() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl IntoIterator for &Manifest {
    type Item = &'static Blob;
    type IntoIter = std::iter::Copied<std::slice::Iter<'static, &'static Blob>>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.iter().copied()
    }
}
