//! Configuration types deserialized from `resembed.toml`.

use resembed_common::ByteSize;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Default base directory for generated units, relative to the project root.
pub const DEFAULT_OUT_DIR: &str = "target/resembed";

/// Default size threshold above which a resource is split into several units.
pub const DEFAULT_CHUNK_SIZE: ByteSize = ByteSize::mib(8);

/// The top-level configuration parsed from `resembed.toml`.
///
/// Contains global generation settings and the named embedding targets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedConfig {
    /// Settings shared by every target unless overridden.
    #[serde(default)]
    pub generate: GenerateConfig,
    /// Named targets (e.g., "target1", "web_assets").
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
}

/// Global generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateConfig {
    /// Base output directory; each target writes to `<out_dir>/<target>/`.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    /// Maximum size of a single generated blob unit.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: ByteSize,
    /// Number of worker threads for blob generation (default: all cores).
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            jobs: None,
        }
    }
}

fn default_out_dir() -> String {
    DEFAULT_OUT_DIR.to_string()
}

fn default_chunk_size() -> ByteSize {
    DEFAULT_CHUNK_SIZE
}

/// Configuration for one embedding target.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Resource root directories scanned for this target.
    #[serde(default, deserialize_with = "deserialize_roots")]
    pub roots: Vec<RootSpec>,
    /// Glob patterns a file must match to be embedded (empty = everything).
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub include: Vec<String>,
    /// Glob patterns excluding files even if they match `include`.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub exclude: Vec<String>,
    /// Per-target override of the base output directory.
    #[serde(default)]
    pub out_dir: Option<String>,
    /// Per-target override of the chunk size.
    #[serde(default)]
    pub chunk_size: Option<ByteSize>,
    /// Module path the generated manifest is included at (default `crate::<target>`).
    #[serde(default)]
    pub mount: Option<String>,
}

/// A resource root directory.
///
/// Uses serde's untagged enum to accept either a bare path string or a table
/// with an explicit virtual prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RootSpec {
    /// A directory whose virtual prefix is its own final path component.
    Path(String),
    /// A directory mounted under an explicit virtual prefix.
    Detailed {
        /// The filesystem path of the root.
        path: String,
        /// Virtual path prefix; an empty string mounts at the top level.
        prefix: Option<String>,
    },
}

impl RootSpec {
    /// Returns the configured filesystem path.
    pub fn path(&self) -> &str {
        match self {
            RootSpec::Path(path) | RootSpec::Detailed { path, .. } => path,
        }
    }

    /// Returns the explicit prefix, if one was given.
    pub fn prefix(&self) -> Option<&str> {
        match self {
            RootSpec::Path(_) => None,
            RootSpec::Detailed { prefix, .. } => prefix.as_deref(),
        }
    }
}

/// Deserializes `roots`, which may be a single root or a list of roots.
fn deserialize_roots<'de, D>(deserializer: D) -> Result<Vec<RootSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(RootSpec),
        Many(Vec<RootSpec>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(root) => vec![root],
        OneOrMany::Many(roots) => roots,
    })
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows TOML config to accept both `exclude = "*.tmp"` (string) and
/// `exclude = ["*.tmp", "*.bak"]` (array of strings).
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
