//! Relocation table listing every absolute pointer written into a table body.
//!
//! The engine rebases each listed location after loading the body at a different address.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use derive_more::derive::{Deref, IntoIterator};

use crate::error::{Error, Result};

/// Ordered body offsets of pointer fields
#[derive(Deref, IntoIterator, Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationTable(Vec<u32>);

impl RelocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one pointer location
    pub fn push(&mut self, location: u64) -> Result<()> {
        let location = u32::try_from(location)
            .map_err(|_| Error::CustomError(format!("pointer location {location:#x} exceeds 32 bits")))?;
        self.0.push(location);
        Ok(())
    }

    /// Record the pointer fields at `fields` of `count` consecutive records starting at `base`
    pub fn push_records(&mut self, base: u64, count: usize, size: u64, fields: &[u64]) -> Result<()> {
        for index in 0..count as u64 {
            for field in fields {
                self.push(base + index * size + field)?;
            }
        }
        Ok(())
    }

    /// Size of the encoded table in bytes
    pub fn byte_len(&self) -> usize {
        self.0.len() * 4
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for location in &self.0 {
            writer.write_u32::<LittleEndian>(*location)?;
        }
        Ok(())
    }
}
