//! Resource discovery.
//!
//! Walks every root of a target, applies the include/exclude globs, derives
//! virtual paths, and fingerprints file contents. The result is sorted by
//! virtual path, so two scans of an unchanged tree are identical.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use rayon::prelude::*;
use resembed_common::{Fingerprint, Fingerprinter, VirtualPath};
use resembed_config::{normalize_path, ResolvedRoot, ResolvedTarget};
use walkdir::WalkDir;

use crate::error::GenerateError;

const READ_BUFFER: usize = 64 * 1024;

/// One discovered resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Root-relative, prefixed path; the lookup key.
    pub path: VirtualPath,
    /// Absolute path of the file on disk. Never embedded.
    pub source: PathBuf,
    /// Byte length at scan time.
    pub len: u64,
    /// Fingerprint of the content at scan time.
    pub fingerprint: Fingerprint,
}

/// Discovers and fingerprints every resource of a target.
///
/// Fingerprinting runs on the current rayon pool.
pub fn scan_target(target: &ResolvedTarget) -> Result<Vec<ResourceRecord>, GenerateError> {
    let mut discovered: BTreeMap<VirtualPath, PathBuf> = BTreeMap::new();

    for root in &target.roots {
        for (path, source) in walk_root(target, root)? {
            if let Some(first) = discovered.get(&path) {
                return Err(GenerateError::Duplicate {
                    target: target.name.clone(),
                    path,
                    first: first.clone(),
                    second: source,
                });
            }
            discovered.insert(path, source);
        }
    }

    let mut records: Vec<ResourceRecord> = discovered
        .into_par_iter()
        .map(|(path, source)| {
            let (fingerprint, len) = fingerprint_file(&source)?;
            tracing::trace!(path = %path, len, "scanned resource");
            Ok(ResourceRecord {
                path,
                source,
                len,
                fingerprint,
            })
        })
        .collect::<Result<_, GenerateError>>()?;
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

/// Lists the files under one root that pass the filters, in walk order.
fn walk_root(
    target: &ResolvedTarget,
    root: &ResolvedRoot,
) -> Result<Vec<(VirtualPath, PathBuf)>, GenerateError> {
    let base = root
        .path
        .canonicalize()
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| GenerateError::MissingRoot {
            target: target.name.clone(),
            path: root.path.clone(),
        })?;
    let filter = ResourceFilter::new(target, &base)?;
    let out_dir = normalize_path(&target.out_dir);

    let walker = WalkDir::new(&base)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            if entry.path() == out_dir.as_path() {
                tracing::debug!(path = %entry.path().display(), "skipping output directory");
                return false;
            }
            entry
                .path()
                .strip_prefix(&base)
                .map_or(true, |relative| !filter.excludes_dir(relative))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| GenerateError::Unreadable {
            path: e.path().map_or_else(|| base.clone(), Path::to_path_buf),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&base)
            .map_err(|_| GenerateError::Traversal {
                target: target.name.clone(),
                path: entry.path().to_path_buf(),
                root: base.clone(),
            })?;
        if !filter.accepts(relative) {
            continue;
        }

        // Symlinks may point anywhere; only their resolved location counts.
        let resolved = entry
            .path()
            .canonicalize()
            .map_err(|e| GenerateError::Unreadable {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
        if !resolved.starts_with(&base) {
            return Err(GenerateError::Traversal {
                target: target.name.clone(),
                path: entry.path().to_path_buf(),
                root: base.clone(),
            });
        }

        let path = VirtualPath::from_relative(&root.prefix, relative).map_err(|e| {
            GenerateError::InvalidPath {
                target: target.name.clone(),
                path: entry.path().to_path_buf(),
                source: e,
            }
        })?;
        files.push((path, entry.path().to_path_buf()));
    }
    Ok(files)
}

/// Include/exclude globs of one root, matched gitignore-style against
/// root-relative paths.
///
/// A glob that matches a directory applies to everything below it, so
/// `exclude = ["drafts"]` drops the whole subtree and `include = ["img/"]`
/// keeps every file under `img`.
struct ResourceFilter {
    include: Option<Override>,
    exclude: Option<Override>,
}

impl ResourceFilter {
    fn new(target: &ResolvedTarget, base: &Path) -> Result<Self, GenerateError> {
        Ok(Self {
            include: build_globs(target, base, &target.include)?,
            exclude: build_globs(target, base, &target.exclude)?,
        })
    }

    /// Returns `true` if the subtree at `relative` is excluded.
    fn excludes_dir(&self, relative: &Path) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|globs| globs.matched(relative, true).is_whitelist())
    }

    /// Returns `true` if the file at `relative` is a resource.
    ///
    /// Excludes win over includes. With no include globs every file is a
    /// candidate.
    fn accepts(&self, relative: &Path) -> bool {
        if self.exclude.as_ref().is_some_and(|globs| hits(globs, relative)) {
            return false;
        }
        match &self.include {
            Some(globs) => hits(globs, relative),
            None => true,
        }
    }
}

/// Returns `true` if `globs` match the file at `relative` or any of its
/// parent directories.
fn hits(globs: &Override, relative: &Path) -> bool {
    globs.matched(relative, false).is_whitelist()
        || relative
            .ancestors()
            .skip(1)
            .take_while(|dir| !dir.as_os_str().is_empty())
            .any(|dir| globs.matched(dir, true).is_whitelist())
}

/// Compiles one glob list; `None` if it is empty.
fn build_globs(
    target: &ResolvedTarget,
    base: &Path,
    patterns: &[String],
) -> Result<Option<Override>, GenerateError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let glob_err = |pattern: &str, e: ignore::Error| GenerateError::Glob {
        target: target.name.clone(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    };

    let mut builder = OverrideBuilder::new(base);
    for pattern in patterns {
        builder.add(pattern).map_err(|e| glob_err(pattern, e))?;
    }
    builder.build().map(Some).map_err(|e| glob_err(&patterns.join(", "), e))
}

/// Streams a file through the fingerprinter.
pub(crate) fn fingerprint_file(path: &Path) -> Result<(Fingerprint, u64), GenerateError> {
    let unreadable = |source: std::io::Error| GenerateError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(unreadable)?;
    let mut fingerprinter = Fingerprinter::new();
    let mut buf = vec![0u8; READ_BUFFER];
    loop {
        let n = file.read(&mut buf).map_err(unreadable)?;
        if n == 0 {
            break;
        }
        fingerprinter.update(&buf[..n]);
    }
    Ok((fingerprinter.finish(), fingerprinter.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn target(roots: Vec<ResolvedRoot>) -> ResolvedTarget {
        ResolvedTarget {
            name: "target1".into(),
            roots,
            include: Vec::new(),
            exclude: Vec::new(),
            out_dir: PathBuf::from("unused"),
            chunk_size: 64,
            mount: "crate::target1".into(),
            jobs: None,
        }
    }

    fn root(path: &Path, prefix: &str) -> ResolvedRoot {
        ResolvedRoot {
            path: path.to_path_buf(),
            prefix: prefix.into(),
        }
    }

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn paths(records: &[ResourceRecord]) -> Vec<&str> {
        records.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn scans_sorted_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("resources");
        write(&res.join("message.txt"), b"hello world");
        write(&res.join("FirstFolder/config.json"), br#"{"a":1}"#);

        let records = scan_target(&target(vec![root(&res, "resources")])).unwrap();
        assert_eq!(
            paths(&records),
            ["resources/FirstFolder/config.json", "resources/message.txt"]
        );
        assert_eq!(records[0].len, 7);
        assert_eq!(records[1].len, 11);
        assert_eq!(records[1].fingerprint, Fingerprint::from_bytes(b"hello world"));
        assert!(records[1].source.is_absolute());
    }

    #[test]
    fn scan_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c/d.txt", "c/a.txt", "B.txt"] {
            write(&dir.path().join(name), name.as_bytes());
        }
        let t = target(vec![root(dir.path(), "")]);
        let first = scan_target(&t).unwrap();
        let second = scan_target(&t).unwrap();
        assert_eq!(first, second);
        assert_eq!(paths(&first), ["B.txt", "a.txt", "b.txt", "c/a.txt", "c/d.txt"]);
    }

    #[test]
    fn include_and_exclude_globs() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.json"), b"{}");
        write(&dir.path().join("b.txt"), b"b");
        write(&dir.path().join("sub/c.json"), b"{}");
        write(&dir.path().join("sub/skip.json"), b"{}");

        let mut t = target(vec![root(dir.path(), "")]);
        t.include = vec!["*.json".into()];
        t.exclude = vec!["**/skip.json".into()];
        let records = scan_target(&t).unwrap();
        assert_eq!(paths(&records), ["a.json", "sub/c.json"]);
    }

    #[test]
    fn exclude_only_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("keep.txt"), b"k");
        write(&dir.path().join(".DS_Store"), b"x");

        let mut t = target(vec![root(dir.path(), "")]);
        t.exclude = vec![".DS_Store".into()];
        assert_eq!(paths(&scan_target(&t).unwrap()), ["keep.txt"]);
    }

    #[test]
    fn excluded_directory_drops_its_subtree() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("message.txt"), b"hello world");
        write(&dir.path().join("FirstFolder/config.json"), br#"{"a":1}"#);
        write(&dir.path().join("FirstFolder/deep/more.txt"), b"m");

        let mut t = target(vec![root(dir.path(), "")]);
        t.exclude = vec!["FirstFolder".into()];
        assert_eq!(paths(&scan_target(&t).unwrap()), ["message.txt"]);

        t.exclude = vec!["deep/".into()];
        assert_eq!(
            paths(&scan_target(&t).unwrap()),
            ["FirstFolder/config.json", "message.txt"]
        );
    }

    #[test]
    fn included_directory_keeps_its_subtree() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("message.txt"), b"hello world");
        write(&dir.path().join("FirstFolder/config.json"), br#"{"a":1}"#);
        write(&dir.path().join("FirstFolder/deep/more.txt"), b"m");

        let mut t = target(vec![root(dir.path(), "")]);
        t.include = vec!["FirstFolder/".into()];
        assert_eq!(
            paths(&scan_target(&t).unwrap()),
            ["FirstFolder/config.json", "FirstFolder/deep/more.txt"]
        );

        t.exclude = vec!["*.txt".into()];
        assert_eq!(paths(&scan_target(&t).unwrap()), ["FirstFolder/config.json"]);
    }

    #[test]
    fn output_directory_inside_root_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("message.txt"), b"hello world");
        write(&dir.path().join("gen/target1/manifest.rs"), b"// generated");
        write(&dir.path().join("gen/target1/record.json"), b"{}");

        let mut t = target(vec![root(dir.path(), "")]);
        t.out_dir = dir.path().join("gen");
        assert_eq!(paths(&scan_target(&t).unwrap()), ["message.txt"]);
    }

    #[test]
    fn duplicate_across_roots_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one");
        let two = dir.path().join("two");
        write(&one.join("a.txt"), b"1");
        write(&two.join("a.txt"), b"2");

        let err = scan_target(&target(vec![root(&one, ""), root(&two, "")])).unwrap_err();
        match err {
            GenerateError::Duplicate {
                path, first, second, ..
            } => {
                assert_eq!(path.as_str(), "a.txt");
                assert!(first.starts_with(one.canonicalize().unwrap()));
                assert!(second.starts_with(two.canonicalize().unwrap()));
            }
            other => panic!("expected duplicate error, got {other}"),
        }
    }

    #[test]
    fn distinct_prefixes_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one");
        let two = dir.path().join("two");
        write(&one.join("a.txt"), b"1");
        write(&two.join("a.txt"), b"2");

        let records = scan_target(&target(vec![root(&one, "one"), root(&two, "two")])).unwrap();
        assert_eq!(paths(&records), ["one/a.txt", "two/a.txt"]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_target(&target(vec![root(&dir.path().join("nope"), "")])).unwrap_err();
        assert!(matches!(err, GenerateError::MissingRoot { .. }));
    }

    #[test]
    fn empty_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_target(&target(vec![root(dir.path(), "")]))
            .unwrap()
            .is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("res");
        write(&dir.path().join("secret.txt"), b"outside");
        fs::create_dir_all(&res).unwrap();
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), res.join("link.txt")).unwrap();

        let err = scan_target(&target(vec![root(&res, "")])).unwrap_err();
        assert!(matches!(err, GenerateError::Traversal { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_inside_root_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("real.txt"), b"data");
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("alias.txt"))
            .unwrap();

        let records = scan_target(&target(vec![root(dir.path(), "")])).unwrap();
        assert_eq!(paths(&records), ["alias.txt", "real.txt"]);
        assert_eq!(records[0].fingerprint, records[1].fingerprint);
    }

    #[test]
    fn fingerprint_streams_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..READ_BUFFER * 3 + 17).map(|i| (i % 251) as u8).collect();
        let path = dir.path().join("big.bin");
        fs::write(&path, &data).unwrap();

        let (fp, len) = fingerprint_file(&path).unwrap();
        assert_eq!(len, data.len() as u64);
        assert_eq!(fp, Fingerprint::from_bytes(&data));
    }
}
