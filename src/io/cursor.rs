//! Position-addressable big-endian cursor.
//!
//! [`BinaryCursor`] wraps any [`Seek`] stream and adds the typed accessors the
//! RWAR codec needs: big-endian integers, raw byte runs and fixed-length tags.
//! Reads are available when the stream is [`Read`], writes when it is
//! [`Write`].
//!
//! Moving the position past the end of the stream and then writing extends
//! the stream, with the gap zero-filled. Both `Cursor<Vec<u8>>` and
//! `std::fs::File` behave this way, which is what lets the packer reserve a
//! field, move on, and backfill it once the value is known.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// Big-endian reader/writer with an explicit absolute position.
pub struct BinaryCursor<S> {
    inner: S,
}

impl BinaryCursor<Cursor<Vec<u8>>> {
    /// Create an empty, growable in-memory cursor.
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }

    /// Consume the cursor and return everything written so far.
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl<'a> BinaryCursor<Cursor<&'a [u8]>> {
    /// Create a read-only cursor over a byte slice.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(Cursor::new(data))
    }
}

impl<S: Seek> BinaryCursor<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Absolute byte offset from the start of the stream.
    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    /// Move to an absolute byte offset. May point past the current end.
    pub fn set_position(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Move relative to the current position.
    pub fn skip(&mut self, delta: i64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Current(delta))?;
        Ok(())
    }
}

impl<S: Read + Seek> BinaryCursor<S> {
    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.inner.read_u8()
    }

    pub fn read_u16(&mut self) -> io::Result<u16> {
        self.inner.read_u16::<BigEndian>()
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        self.inner.read_u32::<BigEndian>()
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        self.inner.read_i32::<BigEndian>()
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a 4-byte section tag.
    pub fn read_tag(&mut self) -> io::Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.inner.read_exact(&mut tag)?;
        Ok(tag)
    }

    /// Read exactly `len` bytes as text. Trailing NUL padding is dropped and
    /// invalid UTF-8 is replaced rather than rejected.
    pub fn read_fixed_string(&mut self, len: usize) -> io::Result<String> {
        let bytes = self.read_bytes(len)?;
        let end = bytes
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

impl<S: Write + Seek> BinaryCursor<S> {
    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.inner.write_u8(value)
    }

    pub fn write_u16(&mut self, value: u16) -> io::Result<()> {
        self.inner.write_u16::<BigEndian>(value)
    }

    pub fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.inner.write_u32::<BigEndian>(value)
    }

    pub fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.inner.write_i32::<BigEndian>(value)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)
    }

    pub fn write_tag(&mut self, tag: &[u8; 4]) -> io::Result<()> {
        self.inner.write_all(tag)
    }

    /// Write `value` into exactly `len` bytes, truncating or zero-padding.
    pub fn write_fixed_string(&mut self, value: &str, len: usize) -> io::Result<()> {
        let bytes = value.as_bytes();
        let used = bytes.len().min(len);
        self.inner.write_all(&bytes[..used])?;
        self.inner.write_all(&vec![0u8; len - used])
    }

    /// Write zero bytes until the position is a multiple of `alignment`.
    ///
    /// Returns the aligned position.
    pub fn pad_to(&mut self, alignment: u64) -> io::Result<u64> {
        let pos = self.position()?;
        let padding = pos.next_multiple_of(alignment) - pos;
        self.inner.write_all(&vec![0u8; padding as usize])?;
        Ok(pos + padding)
    }
}
