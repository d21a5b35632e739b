//! Read-only views over embedded resource bytes.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, BufRead, Read};
use std::str::Utf8Error;

/// One embedded resource.
///
/// The bytes are stored as one or more chunks in static memory. Resources no
/// larger than the generator's chunk size have exactly one chunk and can be
/// borrowed as a single contiguous slice; larger resources are split, and
/// concatenating [`chunks`](Self::chunks) in order reproduces the original
/// file exactly.
#[derive(Clone, Copy)]
pub struct Blob {
    path: &'static str,
    len: usize,
    fingerprint: u128,
    chunks: &'static [&'static [u8]],
}

impl Blob {
    /// Creates a blob descriptor. Called from generated code.
    #[doc(hidden)]
    pub const fn new(
        path: &'static str,
        len: usize,
        fingerprint: u128,
        chunks: &'static [&'static [u8]],
    ) -> Self {
        Self {
            path,
            len,
            fingerprint,
            chunks,
        }
    }

    /// The virtual path this blob was embedded under.
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the resource is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// XXH3-128 fingerprint of the content, as recorded at build time.
    pub const fn fingerprint(&self) -> u128 {
        self.fingerprint
    }

    /// The chunks in order.
    pub const fn chunks(&self) -> &'static [&'static [u8]] {
        self.chunks
    }

    /// Borrows the whole content, if it is stored as a single chunk.
    pub const fn as_slice(&self) -> Option<&'static [u8]> {
        match self.chunks {
            [only] => Some(*only),
            [] => Some(&[]),
            _ => None,
        }
    }

    /// Returns the content, borrowed when contiguous and concatenated otherwise.
    pub fn bytes(&self) -> Cow<'static, [u8]> {
        match self.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.chunks.concat()),
        }
    }

    /// Borrows the content as text, if it is a single chunk of valid UTF-8.
    pub fn as_str(&self) -> Option<&'static str> {
        std::str::from_utf8(self.as_slice()?).ok()
    }

    /// Returns the content as text.
    pub fn text(&self) -> Result<Cow<'static, str>, Utf8Error> {
        match self.bytes() {
            Cow::Borrowed(slice) => std::str::from_utf8(slice).map(Cow::Borrowed),
            Cow::Owned(vec) => match String::from_utf8(vec) {
                Ok(s) => Ok(Cow::Owned(s)),
                Err(e) => Err(e.utf8_error()),
            },
        }
    }

    /// Returns a reader over the content that walks the chunks without copying them.
    pub fn reader(&self) -> BlobReader {
        BlobReader {
            chunks: self.chunks,
            index: 0,
            offset: 0,
        }
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("path", &self.path)
            .field("len", &self.len)
            .field("fingerprint", &format_args!("{:032x}", self.fingerprint))
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

/// Prints the content as text, replacing invalid UTF-8 sequences.
impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => f.write_str(&String::from_utf8_lossy(&self.bytes())),
        }
    }
}

impl AsRef<Blob> for Blob {
    fn as_ref(&self) -> &Blob {
        self
    }
}

/// Sequential reader over a [`Blob`].
#[derive(Debug, Clone)]
pub struct BlobReader {
    chunks: &'static [&'static [u8]],
    index: usize,
    offset: usize,
}

impl Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for BlobReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let chunks = self.chunks;
        while let Some(chunk) = chunks.get(self.index) {
            if self.offset < chunk.len() {
                return Ok(&chunk[self.offset..]);
            }
            self.index += 1;
            self.offset = 0;
        }
        Ok(&[])
    }

    fn consume(&mut self, amt: usize) {
        self.offset += amt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static MESSAGE: Blob = Blob::new("resources/message.txt", 11, 0xfeed, &[b"hello world"]);
    static SPLIT: Blob = Blob::new("big.txt", 11, 0xbeef, &[b"hell", b"o wo", b"rld"]);
    static EMPTY: Blob = Blob::new("empty.txt", 0, 0, &[b""]);
    static BINARY: Blob = Blob::new("bin.dat", 3, 0, &[&[0xff, 0x00, 0x61]]);

    #[test]
    fn single_chunk_is_borrowed() {
        assert_eq!(MESSAGE.as_slice(), Some(&b"hello world"[..]));
        assert!(matches!(MESSAGE.bytes(), Cow::Borrowed(_)));
        assert_eq!(MESSAGE.as_str(), Some("hello world"));
        assert_eq!(MESSAGE.len(), 11);
        assert_eq!(MESSAGE.path(), "resources/message.txt");
        assert_eq!(MESSAGE.fingerprint(), 0xfeed);
    }

    #[test]
    fn multi_chunk_is_concatenated() {
        assert!(SPLIT.as_slice().is_none());
        assert!(SPLIT.as_str().is_none());
        assert_eq!(&*SPLIT.bytes(), b"hello world");
        assert_eq!(SPLIT.text().unwrap(), "hello world");
        assert_eq!(SPLIT.chunks().len(), 3);
    }

    #[test]
    fn reader_walks_all_chunks() {
        let mut out = Vec::new();
        SPLIT.reader().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello world");

        let mut small = [0u8; 3];
        let mut reader = SPLIT.reader();
        assert_eq!(reader.read(&mut small).unwrap(), 3);
        assert_eq!(&small, b"hel");
    }

    #[test]
    fn reader_lines() {
        static LINES: Blob = Blob::new("lines.txt", 8, 0, &[b"ab\ncd", b"\nef"]);
        let lines: Vec<String> = LINES.reader().lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, ["ab", "cd", "ef"]);
    }

    #[test]
    fn empty_blob() {
        assert!(EMPTY.is_empty());
        assert_eq!(EMPTY.as_slice(), Some(&b""[..]));
        assert_eq!(EMPTY.to_string(), "");
        let mut out = Vec::new();
        EMPTY.reader().read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn invalid_utf8() {
        assert!(BINARY.as_str().is_none());
        assert!(BINARY.text().is_err());
        assert_eq!(BINARY.to_string(), "\u{fffd}\u{0}a");
    }

    #[test]
    fn display_prints_text() {
        assert_eq!(MESSAGE.to_string(), "hello world");
        assert_eq!(SPLIT.to_string(), "hello world");
    }

    #[test]
    fn debug_is_compact() {
        let s = format!("{MESSAGE:?}");
        assert!(s.contains("resources/message.txt"));
        assert!(s.contains("chunks: 1"));
    }
}
