//! Manifest generation.
//!
//! Renders the `manifest.rs` of a target: one static `Blob` per resource,
//! the sorted `MANIFEST`, and the `embed!`/`has!` macros that resolve path
//! literals at compile time. Everything in the file is derived from the
//! record entries and virtual paths, never from absolute source paths, so
//! identical inputs produce identical bytes on every machine.

use std::collections::{BTreeMap, HashSet};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use resembed_cache::{RecordEntry, UnitStore, BLOBS_SUBDIR};
use resembed_common::VirtualPath;

use crate::error::GenerateError;

/// File name of the generated manifest inside a target directory.
pub const MANIFEST_FILE: &str = "manifest.rs";

/// Identifiers the generated file defines itself.
const RESERVED: &[&str] = &["MANIFEST"];

/// Returns the path of a target's manifest.
pub fn manifest_path(target_dir: &Path) -> PathBuf {
    target_dir.join(MANIFEST_FILE)
}

/// Inputs for rendering one target's manifest.
#[derive(Debug, Clone, Copy)]
pub struct ManifestSpec<'a> {
    /// Target name; namespaces the generated macros.
    pub target: &'a str,
    /// Module path the manifest is included at, e.g. `crate::target1`.
    pub mount: &'a str,
    /// Tool version written into the header comment.
    pub tool_version: &'a str,
}

/// Derives the accessor identifier for a virtual path.
///
/// ASCII letters and digits are upper-cased, every other run of characters
/// becomes a single `_`. A leading digit gets an `R_` prefix.
pub fn accessor_ident(path: &VirtualPath) -> String {
    let mut ident = String::with_capacity(path.as_str().len());
    for c in path.as_str().chars() {
        if c.is_ascii_alphanumeric() {
            ident.push(c.to_ascii_uppercase());
        } else if !ident.is_empty() && !ident.ends_with('_') {
            ident.push('_');
        }
    }
    while ident.ends_with('_') {
        ident.pop();
    }
    if ident.is_empty() {
        return "RESOURCE".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert_str(0, "R_");
    }
    ident
}

/// Assigns a unique identifier to every path, in path order.
///
/// Collisions are resolved with a numeric suffix (`_2`, `_3`, ...).
fn assign_idents<'a>(paths: impl Iterator<Item = &'a VirtualPath>) -> Vec<String> {
    let mut used: HashSet<String> = RESERVED.iter().map(|s| s.to_string()).collect();
    paths
        .map(|path| {
            let base = accessor_ident(path);
            let mut ident = base.clone();
            let mut n = 2;
            while used.contains(&ident) {
                ident = format!("{base}_{n}");
                n += 1;
            }
            used.insert(ident.clone());
            ident
        })
        .collect()
}

/// Name of the generated sorted path table. Accessor identifiers never start
/// with `_`, so it cannot collide with one.
const PATHS_TABLE: &str = "__RESEMBED_PATHS";

/// Renders the manifest source for a target.
///
/// `embed!` and `has!` get one arm per path as spelled by the generator.
/// Literals spelled differently fall through to a constant lookup in the
/// sorted path table, which fails constant evaluation for an unknown path.
pub fn render_manifest(spec: &ManifestSpec<'_>, entries: &BTreeMap<VirtualPath, RecordEntry>) -> String {
    let idents = assign_idents(entries.keys());
    let embed_macro = format!("__resembed_embed_{}", spec.target);
    let has_macro = format!("__resembed_has_{}", spec.target);
    let mount = spec.mount;

    let mut out = String::new();
    line(
        &mut out,
        &format!(
            "// @generated by resembed {} for target `{}`. Do not edit.",
            spec.tool_version, spec.target
        ),
    );

    for ((path, entry), ident) in entries.iter().zip(&idents) {
        line(&mut out, "");
        line(&mut out, &format!("/// `{path}` ({} bytes)", entry.len));
        line(&mut out, "#[allow(dead_code)]");
        line(&mut out, &format!("pub static {ident}: ::resembed::Blob = ::resembed::Blob::new("));
        line(&mut out, &format!("    {:?},", path.as_str()));
        line(&mut out, &format!("    {},", entry.len));
        line(&mut out, &format!("    0x{:032x},", entry.fingerprint.as_u128()));
        line(&mut out, "    &[");
        for index in 0..entry.chunks {
            let file = format!(
                "{BLOBS_SUBDIR}/{}",
                UnitStore::chunk_file_name(&entry.unit_key, index)
            );
            line(&mut out, &format!("        include_bytes!({file:?}) as &[u8],"));
        }
        line(&mut out, "    ],");
        line(&mut out, ");");
    }

    let blob_refs: Vec<String> = idents.iter().map(|ident| format!("&{ident}")).collect();
    line(&mut out, "");
    line(&mut out, &format!("/// Every resource of target `{}`, sorted by path.", spec.target));
    line(&mut out, "#[allow(dead_code)]");
    line(
        &mut out,
        &format!(
            "pub static MANIFEST: ::resembed::Manifest = ::resembed::Manifest::new({:?}, &[{}]);",
            spec.target,
            blob_refs.join(", ")
        ),
    );

    let path_literals: Vec<String> = entries.keys().map(|p| format!("{:?}", p.as_str())).collect();
    line(&mut out, "");
    line(&mut out, "#[doc(hidden)]");
    line(&mut out, "#[allow(dead_code)]");
    line(
        &mut out,
        &format!("pub const {PATHS_TABLE}: &[&str] = &[{}];", path_literals.join(", ")),
    );

    line(&mut out, "");
    line(&mut out, "#[allow(unused_macros)]");
    line(&mut out, &format!("macro_rules! {embed_macro} {{"));
    for (literal, ident) in path_literals.iter().zip(&idents) {
        line(&mut out, &format!("    ({literal}) => {{ &{mount}::{ident} }};"));
    }
    line(&mut out, "    ($path:literal) => {{");
    line(
        &mut out,
        &format!(
            "        const INDEX: usize = match ::resembed::manifest::find_index({mount}::{PATHS_TABLE}, $path) {{"
        ),
    );
    line(&mut out, "            ::core::option::Option::Some(index) => index,");
    line(
        &mut out,
        &format!(
            "            ::core::option::Option::None => ::core::panic!(\"{{}}\", ::core::concat!(\"resource `\", $path, \"` is not embedded in target `{}`\")),",
            spec.target
        ),
    );
    line(&mut out, "        };");
    line(&mut out, &format!("        {mount}::MANIFEST.at(INDEX)"));
    line(&mut out, "    }};");
    line(
        &mut out,
        "    ($($other:tt)*) => { ::core::compile_error!(\"embed! expects a single string literal path\") };",
    );
    line(&mut out, "}");
    line(&mut out, "#[allow(unused_imports)]");
    line(&mut out, &format!("pub(crate) use {embed_macro} as embed;"));

    line(&mut out, "");
    line(&mut out, "#[allow(unused_macros)]");
    line(&mut out, &format!("macro_rules! {has_macro} {{"));
    for literal in &path_literals {
        line(&mut out, &format!("    ({literal}) => {{ true }};"));
    }
    line(
        &mut out,
        &format!(
            "    ($path:literal) => {{ ::resembed::manifest::find_index({mount}::{PATHS_TABLE}, $path).is_some() }};"
        ),
    );
    line(&mut out, "}");
    line(&mut out, "#[allow(unused_imports)]");
    line(&mut out, &format!("pub(crate) use {has_macro} as has;"));

    out
}

/// Appends one line of generated source.
fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

/// Writes `content` to `path` unless the file already holds exactly that.
///
/// The new content goes to a temporary file in the same directory and is
/// renamed into place. Returns `true` if the file was written.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool, GenerateError> {
    if std::fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
        return Ok(false);
    }

    let io_err = |source: std::io::Error| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(true)
}

/// Removes a target's manifest if present.
///
/// Called before any unit is rewritten, so an aborted run never leaves a
/// manifest pointing at half-written units.
pub fn remove_manifest(target_dir: &Path) -> Result<bool, GenerateError> {
    let path = manifest_path(target_dir);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(GenerateError::Io { path, source }),
    }
}
