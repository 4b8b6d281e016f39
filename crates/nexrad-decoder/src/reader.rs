//! Big-endian cursor over a borrowed byte buffer.
//!
//! Every read is bounds-checked against the buffer length and returns
//! [`ReadError::OutOfBounds`] instead of panicking. Reads never allocate;
//! sub-range reads hand back slices of the original buffer.

use crate::error::ReadError;

/// Bounded big-endian reader over an immutable byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a reader positioned at `offset`.
    ///
    /// The offset itself is not validated; the first read past the end fails.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Move the cursor to an absolute position.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Advance the cursor by `count` bytes, failing if that passes the end.
    pub fn skip(&mut self, count: usize) -> Result<(), ReadError> {
        self.check(count)?;
        self.offset += count;
        Ok(())
    }

    /// Read `width` raw bytes and advance.
    pub fn read_bytes(&mut self, width: usize) -> Result<&'a [u8], ReadError> {
        self.check(width)?;
        let slice = &self.data[self.offset..self.offset + width];
        self.offset += width;
        Ok(slice)
    }

    /// Borrow `width` bytes at an absolute offset without moving the cursor.
    pub fn slice_at(&self, offset: usize, width: usize) -> Result<&'a [u8], ReadError> {
        match offset.checked_add(width) {
            Some(end) if end <= self.data.len() => Ok(&self.data[offset..end]),
            _ => Err(ReadError::OutOfBounds {
                offset,
                width,
                len: self.data.len(),
            }),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadError> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, ReadError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ReadError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    /// Read a fixed-size array and advance.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }

    /// Read a fixed-width ASCII field, trimming trailing spaces and NULs.
    pub fn read_ascii(&mut self, width: usize) -> Result<String, ReadError> {
        let raw = self.read_bytes(width)?;
        Ok(String::from_utf8_lossy(raw)
            .trim_end_matches(|c: char| c == ' ' || c == '\0')
            .to_string())
    }

    fn check(&self, width: usize) -> Result<(), ReadError> {
        match self.offset.checked_add(width) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(ReadError::OutOfBounds {
                offset: self.offset,
                width,
                len: self.data.len(),
            }),
        }
    }
}
