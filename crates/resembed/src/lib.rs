//! Compile-time checked access to resources embedded at build time.
//!
//! A build step (usually `build.rs` via `resembed_gen::Embed`) scans resource
//! directories and writes, per target, a set of blob units plus a
//! `manifest.rs`. Including that manifest into a module gives the module:
//!
//! - one `static` [`Blob`] per resource, named after its virtual path
//!   (`resources/message.txt` becomes `RESOURCES_MESSAGE_TXT`);
//! - `MANIFEST`, a [`Manifest`] listing every blob in path order;
//! - `embed!("virtual/path")`, which resolves a path literal to its blob and
//!   fails to compile for a path the target does not contain (any spelling of
//!   the literal works, including raw strings and escapes);
//! - `has!("virtual/path")`, which expands to `true` or `false`.
//!
//! ```ignore
//! mod target1 {
//!     resembed::include_target!("target1");
//! }
//!
//! fn main() {
//!     println!("{}", target1::embed!("resources/message.txt"));
//! }
//! ```
//!
//! Everything is backed by static data: lookups perform no I/O, need no
//! initialization, and always observe the same bytes.

#![warn(missing_docs)]

pub mod blob;
pub mod manifest;

pub use blob::{Blob, BlobReader};
pub use manifest::Manifest;

/// Includes the generated manifest of a target into the current module.
///
/// With one argument, the manifest is read from `$OUT_DIR/resembed/<target>/`,
/// which is where `resembed_gen::Embed` writes by default from a build script.
/// With two arguments, it is read from `<dir>/<target>/`, where `dir` is
/// relative to the invoking source file.
#[macro_export]
macro_rules! include_target {
    ($target:literal) => {
        include!(concat!(
            env!("OUT_DIR"),
            "/resembed/",
            $target,
            "/manifest.rs"
        ));
    };
    ($target:literal, $dir:literal) => {
        include!(concat!($dir, "/", $target, "/manifest.rs"));
    };
}
