//! Virtual paths: the root-stripped, forward-slash keys of embedded resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Errors produced when deriving or parsing a virtual path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VirtualPathError {
    /// The path has no segments.
    #[error("virtual path is empty")]
    Empty,

    /// The path contains `..` or an absolute component and would escape its root.
    #[error("path '{path}' escapes its resource root")]
    Traversal {
        /// The offending path as written.
        path: String,
    },

    /// A path component is not valid UTF-8.
    #[error("path {} is not valid UTF-8", path.display())]
    NonUtf8 {
        /// The offending path.
        path: PathBuf,
    },

    /// A single segment contains a character that cannot appear in a virtual path.
    #[error("invalid virtual path segment '{segment}'")]
    InvalidSegment {
        /// The offending segment.
        segment: String,
    },
}

/// A normalized resource key such as `resources/FirstFolder/config.json`.
///
/// Segments are joined with `/` regardless of the host platform, never contain
/// `.` or `..`, and are never empty. Ordering is plain lexicographic byte order
/// of the joined string, which is the order resources appear in a manifest.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualPath(String);

impl VirtualPath {
    /// Parses a virtual path written by hand, accepting either separator.
    ///
    /// Repeated separators and `.` segments are dropped; `..` is rejected.
    pub fn parse(s: &str) -> Result<Self, VirtualPathError> {
        let mut segments = Vec::new();
        for segment in s.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(VirtualPathError::Traversal {
                        path: s.to_string(),
                    })
                }
                _ => segments.push(segment),
            }
        }
        if segments.is_empty() {
            return Err(VirtualPathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    /// Derives a virtual path from a path relative to a resource root,
    /// mounted under `prefix` (which may be empty).
    ///
    /// Any `..`, root or drive component in `relative` is a traversal error.
    pub fn from_relative(prefix: &str, relative: &Path) -> Result<Self, VirtualPathError> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in prefix.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(VirtualPathError::Traversal {
                        path: prefix.to_string(),
                    })
                }
                _ => segments.push(segment),
            }
        }

        for component in relative.components() {
            match component {
                Component::Normal(os) => {
                    let segment = os.to_str().ok_or_else(|| VirtualPathError::NonUtf8 {
                        path: relative.to_path_buf(),
                    })?;
                    if segment.contains(['/', '\\']) {
                        return Err(VirtualPathError::InvalidSegment {
                            segment: segment.to_string(),
                        });
                    }
                    segments.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(VirtualPathError::Traversal {
                        path: relative.display().to_string(),
                    });
                }
            }
        }

        if segments.is_empty() {
            return Err(VirtualPathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the final segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl TryFrom<String> for VirtualPath {
    type Error = VirtualPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VirtualPath> for String {
    fn from(value: VirtualPath) -> Self {
        value.0
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualPath({:?})", self.0)
    }
}
