//! # Byte Source Abstraction
//!
//! This module defines the byte-source capability the demuxers pull from,
//! along with the two stock implementations:
//!
//! - [`FileSource`]: a buffered, file-backed source
//! - [`IoSource`]: an adapter over any `Read + Seek` value (used with
//!   [`std::io::Cursor`] in tests and for in-memory images)
//!
//! The demuxer owns its source for the duration of a session but never
//! closes the underlying resource on its own; `into_source`/`close` on the
//! container hand it back intact.
//!
//! ```rust
//! use mpegio::io::{ByteSource, IoSource};
//! use std::io::Cursor;
//!
//! # fn main() -> mpegio::Result<()> {
//! let mut src = IoSource::new(Cursor::new(vec![0x00, 0x00, 0x01, 0xBA]));
//! assert_eq!(src.read_be32()?, 0x0000_01BA);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{MpegError, Result};

/// A seekable or streamed byte source consumed by the demuxers.
///
/// Implementations report end-of-file the way C stdio does: [`at_end`]
/// becomes true only after a read already came up empty, not merely when
/// the position reaches the last byte.
///
/// [`at_end`]: ByteSource::at_end
pub trait ByteSource {
    /// Reads up to `buf.len()` bytes, returning how many were read.
    /// Zero means end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Moves the read position, returning the new absolute offset.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Returns the current absolute read position.
    fn tell(&mut self) -> Result<u64>;

    /// Total size in bytes, or `None` when unknown (e.g. a pure stream).
    fn size(&mut self) -> Option<u64>;

    /// True once a read has hit end of file.
    fn at_end(&self) -> bool;

    /// True for sources without random access. Streamed sources never get
    /// duration estimation.
    fn is_streamed(&self) -> bool {
        false
    }

    /// Reads exactly one byte.
    ///
    /// Fails with [`MpegError::EndOfStream`] at end of file.
    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        if self.read(&mut b)? == 0 {
            return Err(MpegError::EndOfStream);
        }
        Ok(b[0])
    }

    /// Fills `buf` completely.
    ///
    /// Fails with [`MpegError::EndOfStream`] when no bytes were available at
    /// all, and with [`MpegError::Read`] on a short read mid-structure.
    fn read_exact_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut got = 0;
        while got < buf.len() {
            let n = self.read(&mut buf[got..])?;
            if n == 0 {
                if got == 0 {
                    return Err(MpegError::EndOfStream);
                }
                return Err(MpegError::Read(format!(
                    "short read: wanted {} bytes, got {}",
                    buf.len(),
                    got
                )));
            }
            got += n;
        }
        Ok(())
    }

    /// Reads a big-endian 16-bit value.
    fn read_be16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_exact_buf(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    /// Reads a big-endian 32-bit value.
    fn read_be32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact_buf(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }
}

/// A buffered, file-backed byte source.
pub struct FileSource {
    inner: BufReader<File>,
    size: u64,
    eof: bool,
}

impl FileSource {
    /// Opens the file at `path` and caches its size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(FileSource {
            inner: BufReader::new(file),
            size,
            eof: false,
        })
    }
}

impl ByteSource for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .inner
            .read(buf)
            .map_err(|e| MpegError::Read(e.to_string()))?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.eof = false;
        self.inner
            .seek(pos)
            .map_err(|e| MpegError::Seek(e.to_string()))
    }

    fn tell(&mut self) -> Result<u64> {
        self.inner
            .stream_position()
            .map_err(|e| MpegError::Seek(e.to_string()))
    }

    fn size(&mut self) -> Option<u64> {
        Some(self.size)
    }

    fn at_end(&self) -> bool {
        self.eof
    }
}

/// Adapter exposing any `Read + Seek` value as a [`ByteSource`].
#[derive(Debug)]
pub struct IoSource<T> {
    inner: T,
    eof: bool,
}

impl<T: Read + Seek> IoSource<T> {
    /// Wraps `inner`.
    pub fn new(inner: T) -> Self {
        IoSource { inner, eof: false }
    }

    /// Unwraps back into the inner reader.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Seek> ByteSource for IoSource<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .inner
            .read(buf)
            .map_err(|e| MpegError::Read(e.to_string()))?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.eof = false;
        self.inner
            .seek(pos)
            .map_err(|e| MpegError::Seek(e.to_string()))
    }

    fn tell(&mut self) -> Result<u64> {
        self.inner
            .stream_position()
            .map_err(|e| MpegError::Seek(e.to_string()))
    }

    fn size(&mut self) -> Option<u64> {
        let pos = self.inner.stream_position().ok()?;
        let end = self.inner.seek(SeekFrom::End(0)).ok()?;
        self.inner.seek(SeekFrom::Start(pos)).ok()?;
        Some(end)
    }

    fn at_end(&self) -> bool {
        self.eof
    }
}
