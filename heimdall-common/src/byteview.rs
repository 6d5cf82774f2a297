//! A wrapper type providing direct, cheaply cloneable access to binary data.
//!
//! See [`ByteView`] for details.

use std::borrow::Cow;
use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

#[derive(Debug)]
enum ByteViewBacking<'a> {
    Buf(Cow<'a, [u8]>),
    Mmap(Mmap),
}

impl Deref for ByteViewBacking<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match *self {
            ByteViewBacking::Buf(ref buf) => buf,
            ByteViewBacking::Mmap(ref mmap) => mmap,
        }
    }
}

/// A smart pointer for byte data read from disk or held in memory.
///
/// `ByteView` uniformly represents bytes obtained by memory-mapping a file or
/// by owning/borrowing a buffer. It dereferences to `&[u8]` and is cheap to
/// clone (an `Arc` bump), which matters because a single input file can be
/// read once and then handed to the object reader, the DWARF extractor and
/// the checksum routines without re-reading it from disk.
///
/// A `ByteView` is deliberately transient: readers borrow `&'data [u8]` out
/// of it for the duration of one extraction call and do not retain the
/// `ByteView` itself past that call, matching the "transient per-file
/// snapshot" lifecycle of `ObjectView` in the extraction pipeline.
#[derive(Clone, Debug)]
pub struct ByteView<'a> {
    backing: Arc<ByteViewBacking<'a>>,
}

impl<'a> ByteView<'a> {
    fn with_backing(backing: ByteViewBacking<'a>) -> Self {
        ByteView {
            backing: Arc::new(backing),
        }
    }

    /// Constructs a `ByteView` from a `Cow`.
    pub fn from_cow(cow: Cow<'a, [u8]>) -> Self {
        ByteView::with_backing(ByteViewBacking::Buf(cow))
    }

    /// Constructs a `ByteView` from a borrowed byte slice.
    pub fn from_slice(buffer: &'a [u8]) -> Self {
        ByteView::from_cow(Cow::Borrowed(buffer))
    }

    /// Constructs a `ByteView` from an owned buffer.
    pub fn from_vec(buffer: Vec<u8>) -> Self {
        ByteView::from_cow(Cow::Owned(buffer))
    }

    /// Memory-maps an open file handle.
    ///
    /// Falls back to reading the file into an owned buffer when mapping
    /// fails (e.g. zero-length files, some network filesystems), since a
    /// failed mmap should not turn into a hard read error for callers that
    /// only care about the bytes.
    pub fn map_file(file: File) -> io::Result<ByteView<'static>> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(ByteView::from_vec(Vec::new()));
        }

        match unsafe { Mmap::map(&file) } {
            Ok(mmap) => Ok(ByteView::with_backing(ByteViewBacking::Mmap(mmap))),
            Err(_) => {
                use std::io::Read;
                let mut file = file;
                let mut buf = Vec::with_capacity(len as usize);
                file.read_to_end(&mut buf)?;
                Ok(ByteView::from_vec(buf))
            }
        }
    }

    /// Opens and memory-maps the file at `path`.
    pub fn open(path: &Path) -> io::Result<ByteView<'static>> {
        ByteView::map_file(File::open(path)?)
    }

    /// Returns the contents as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        self.backing.deref()
    }

    /// The length of the underlying buffer in bytes.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Deref for ByteView<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for ByteView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

// The `Arc` keeps the backing buffer alive for as long as any clone of this
// `ByteView` exists, and neither `Cow` nor `Mmap` ever relocates the bytes
// they hand out, so `deref()` always returns the same address.
unsafe impl stable_deref_trait::StableDeref for ByteView<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn map_file_roundtrip() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"1234").unwrap();
        let view = ByteView::map_file(file).unwrap();
        assert_eq!(view.as_slice(), b"1234");
    }

    #[test]
    fn from_vec_is_cheap_to_clone() {
        let view = ByteView::from_vec(vec![1, 2, 3]);
        let other = view.clone();
        assert_eq!(view.as_slice(), other.as_slice());
    }

    #[test]
    fn empty_file_does_not_panic() {
        let file = tempfile::tempfile().unwrap();
        let view = ByteView::map_file(file).unwrap();
        assert!(view.is_empty());
    }
}
