//! Position tracking reader over a loaded table body.

use std::io;

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Fixed size on-disk records that can be pulled off a [`ByteCursor`]
pub trait Record {
    /// Size of the record in bytes
    const SIZE: usize;
}

/// Sequential reader over a fixed byte buffer with absolute seeking.
///
/// Every multi-byte read is little-endian. Reads past the end of the buffer fail with
/// [`Error::OutOfBounds`] and leave the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current absolute offset
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Length of the underlying buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move to an absolute offset. Bounds are checked by the next read.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Read `length` bytes and advance past them
    pub fn read(&mut self, length: usize) -> Result<&'a [u8]> {
        let bytes = self.read_at(self.offset, length)?;
        self.offset += length;
        Ok(bytes)
    }

    /// Peek `length` bytes at `offset` without moving
    pub fn read_at(&self, offset: usize, length: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .map(|end| &self.data[offset..end])
            .ok_or(Error::OutOfBounds {
                offset,
                length,
                size: self.data.len(),
            })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read(2)?.read_i16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read(4)?.read_u32::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read(4)?.read_i32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.read(8)?.read_u64::<LittleEndian>()?)
    }

    /// Read a fixed size record and advance past it
    pub fn read_record<T>(&mut self) -> Result<T>
    where
        T: Record + for<'b> BinRead<Args<'b> = ()>,
    {
        let bytes = self.read(T::SIZE)?;
        Ok(T::read_le_args(&mut io::Cursor::new(bytes), ())?)
    }

    /// Read a fixed size record at `offset` without moving
    pub fn read_record_at<T>(&self, offset: usize) -> Result<T>
    where
        T: Record + for<'b> BinRead<Args<'b> = ()>,
    {
        let bytes = self.read_at(offset, T::SIZE)?;
        Ok(T::read_le_args(&mut io::Cursor::new(bytes), ())?)
    }

    /// Read a zero terminated string starting at `offset`, one character per byte
    pub fn read_null_terminated_string(&self, offset: usize) -> Result<String> {
        let tail = self.data.get(offset..).ok_or(Error::OutOfBounds {
            offset,
            length: 1,
            size: self.data.len(),
        })?;

        let Some(end) = tail.iter().position(|b| *b == 0) else {
            return Err(Error::OutOfBounds {
                offset,
                length: tail.len() + 1,
                size: self.data.len(),
            });
        };

        Ok(tail[..end].iter().map(|b| *b as char).collect())
    }

    /// Read exactly `length` bytes as a string, skipping every zero byte in the span
    pub fn read_sized_string(&mut self, length: usize) -> Result<String> {
        Ok(decode_sized(self.read(length)?))
    }

    /// Same as [`ByteCursor::read_sized_string`] without moving
    pub fn read_sized_string_at(&self, offset: usize, length: usize) -> Result<String> {
        Ok(decode_sized(self.read_at(offset, length)?))
    }
}

fn decode_sized(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| **b != 0)
        .map(|b| *b as char)
        .collect()
}
