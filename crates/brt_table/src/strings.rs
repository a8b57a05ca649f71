//! String table packing and resolution.
//!
//! The pointer variants store every string once, zero terminated, in a block directly after the
//! header. The CompressedStrings variant stores strings as entries that may extend the prefix of
//! an earlier entry; this library only ever writes standalone entries, chaining 127 byte chunks
//! when a string is longer than a single entry can express.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use crate::cursor::{ByteCursor, Record};
use crate::error::{Error, Result};
use crate::types::StringRef;

/// Encode a string one byte per character.
///
/// Characters up to `U+00FF` map to a single byte, the inverse of how strings are read. Anything
/// wider falls back to its UTF-8 bytes.
pub fn encode_string(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len());
    for c in value.chars() {
        match u8::try_from(c) {
            Ok(byte) => bytes.push(byte),
            Err(_) => {
                trace!("character {:?} does not fit one byte", c);
                let mut buffer = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buffer).as_bytes());
            }
        }
    }
    bytes
}

/// Pad `length` up to the next multiple of `alignment`
pub fn align(length: usize, alignment: usize) -> usize {
    length.div_ceil(alignment) * alignment
}

/// De-duplicating block of zero terminated strings placed at a fixed base offset
#[derive(Debug, Clone)]
pub struct StringTableBuilder {
    base: u64,
    buffer: Vec<u8>,
    offsets: IndexMap<String, u64>,
}

impl StringTableBuilder {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            buffer: Vec::new(),
            offsets: IndexMap::new(),
        }
    }

    /// Add a string unless it is already present, returning its absolute offset
    pub fn add(&mut self, value: &str) -> u64 {
        if let Some(offset) = self.offsets.get(value) {
            return *offset;
        }

        let offset = self.base + self.buffer.len() as u64;
        self.buffer.extend(encode_string(value));
        self.buffer.push(0);
        self.offsets.insert(value.to_owned(), offset);
        offset
    }

    /// Absolute offset of a previously added string
    pub fn offset(&self, value: &str) -> Option<u64> {
        self.offsets.get(value).copied()
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Strings in the order they were first added
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.offsets.keys().map(|s| s.as_str())
    }

    /// Finish the block, padding it with `16 - len % 16` zero bytes
    ///
    /// An already aligned block still receives a full 16 bytes of padding.
    pub fn finish(mut self) -> (Vec<u8>, IndexMap<String, u64>) {
        let padding = 16 - self.buffer.len() % 16;
        self.buffer.resize(self.buffer.len() + padding, 0);
        (self.buffer, self.offsets)
    }
}

/// Builder for the CompressedStrings string table
///
/// Strings are de-duplicated by their lower-cased form and offsets are relative to the start of
/// the table.
#[derive(Debug, Clone, Default)]
pub struct CompressedStringTable {
    buffer: Vec<u8>,
    entries: u32,
    references: HashMap<String, StringRef>,
}

impl CompressedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string, returning the reference records should store
    pub fn add(&mut self, value: &str) -> Result<StringRef> {
        if value.is_empty() {
            return Ok(StringRef::EMPTY);
        }

        let key = value.to_lowercase();
        if let Some(reference) = self.references.get(&key) {
            return Ok(*reference);
        }

        let bytes = encode_string(value);
        let mut base = StringRef::NONE;
        for chunk in bytes.chunks(StringRef::MAX_LENGTH) {
            let offset = i16::try_from(self.buffer.len())
                .map_err(|_| Error::StringTableOverflow(self.buffer.len()))?;

            self.buffer.extend(base.to_bytes());
            self.buffer.extend_from_slice(chunk);
            self.entries += 1;

            base = StringRef {
                offset,
                identifier: StringRef::LITERAL,
                length: chunk.len() as u8,
            };
        }

        self.references.insert(key, base);
        Ok(base)
    }

    /// Number of entries written, counting every chunk of a split string
    pub fn entry_count(&self) -> u32 {
        self.entries
    }

    /// Finish the table, padding it up to a 16 byte boundary
    pub fn finish(mut self) -> Vec<u8> {
        self.buffer.resize(align(self.buffer.len(), 16), 0);
        self.buffer
    }
}

impl StringRef {
    fn to_bytes(self) -> [u8; 4] {
        let [low, high] = self.offset.to_le_bytes();
        [low, high, self.identifier, self.length]
    }
}

/// Resolves [`StringRef`]s against a CompressedStrings string table
///
/// An entry is a base [`StringRef`] followed by its own text. The full string of a reference is
/// the resolved base (read with the base's own length) followed by `length` bytes of the entry's
/// text. Resolved strings are memoized by reference so shared chains are only walked once.
pub struct StringResolver<'a> {
    cursor: ByteCursor<'a>,
    table: usize,
    resolved: HashMap<(i16, u8), String>,
}

impl<'a> StringResolver<'a> {
    /// `table` is the absolute offset of the string table within the cursor's buffer
    pub fn new(cursor: ByteCursor<'a>, table: usize) -> Self {
        Self {
            cursor,
            table,
            resolved: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, reference: StringRef) -> Result<String> {
        let mut segments: Vec<((i16, u8), String)> = Vec::new();
        let mut prefix = String::new();
        let mut current = reference;

        while !current.is_none() {
            let key = (current.offset, current.length);
            if let Some(known) = self.resolved.get(&key) {
                prefix = known.clone();
                break;
            }
            if segments.iter().any(|(seen, _)| *seen == key) {
                return Err(Error::InvalidStringReference(current.offset));
            }

            let length = current.length as usize;
            let (entry, text_offset) = self
                .table
                .checked_add(current.offset as usize)
                .and_then(|entry| Some((entry, entry.checked_add(StringRef::SIZE)?)))
                .ok_or(Error::OutOfBounds {
                    offset: self.table,
                    length: StringRef::SIZE + length,
                    size: self.cursor.len(),
                })?;
            let base: StringRef = self.cursor.read_record_at(entry)?;
            let text = self.cursor.read_sized_string_at(text_offset, length)?;

            trace!(
                offset = current.offset,
                length = current.length,
                base = base.offset,
                "string entry"
            );

            segments.push((key, text));
            current = base;
        }

        for (key, text) in segments.into_iter().rev() {
            prefix.push_str(&text);
            self.resolved.insert(key, prefix.clone());
        }

        Ok(prefix)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::cursor::ByteCursor;
    use crate::error::{Error, Result};
    use crate::strings::{
        align, encode_string, CompressedStringTable, StringResolver, StringTableBuilder,
    };
    use crate::types::StringRef;

    #[test]
    fn pointer_table_dedupes_in_first_seen_order() {
        let mut builder = StringTableBuilder::new(0x50);
        assert_eq!(builder.add("ui"), 0x50);
        assert_eq!(builder.add(""), 0x53);
        assert_eq!(builder.add("win32"), 0x54);
        assert_eq!(builder.add("ui"), 0x50);
        assert_eq!(builder.add("UI"), 0x5A);

        assert_eq!(builder.len(), 4);
        assert_eq!(builder.strings().collect::<Vec<_>>(), vec!["ui", "", "win32", "UI"]);

        let (buffer, offsets) = builder.finish();
        assert_eq!(buffer.len(), 16);
        assert_eq!(&buffer[..13], b"ui\0\0win32\0UI\0");
        assert_eq!(offsets.get("win32"), Some(&0x54));
    }

    #[test]
    fn pointer_table_pads_aligned_block() {
        let mut builder = StringTableBuilder::new(0);
        builder.add("fifteen bytes!!");
        assert_eq!(builder.offset("fifteen bytes!!"), Some(0));

        let (buffer, _) = builder.finish();
        assert_eq!(buffer.len(), 32);
    }

    #[test]
    fn alignment() {
        assert_eq!(align(0, 16), 0);
        assert_eq!(align(1, 16), 16);
        assert_eq!(align(16, 16), 16);
        assert_eq!(align(17, 16), 32);
    }

    #[test]
    fn wide_characters_fall_back_to_utf8() {
        assert_eq!(encode_string("a\u{e9}"), vec![0x61, 0xE9]);
        assert_eq!(encode_string("\u{2603}"), vec![0xE2, 0x98, 0x83]);
    }

    #[test]
    fn compressed_table_writes_literal_entries() -> Result<()> {
        let mut table = CompressedStringTable::new();
        let first = table.add("win32/ui")?;
        let again = table.add("WIN32/UI")?;
        let second = table.add("art")?;
        assert_eq!(table.add("")?, StringRef::EMPTY);

        assert_eq!(first, again);
        assert_eq!(
            first,
            StringRef {
                offset: 0,
                identifier: StringRef::LITERAL,
                length: 8
            }
        );
        assert_eq!(second.offset, 12);
        assert_eq!(table.entry_count(), 2);

        #[rustfmt::skip]
        let expected = [
            0xFF, 0xFF, 0xFF, 0xFF, b'w', b'i', b'n', b'3', b'2', b'/', b'u', b'i',
            0xFF, 0xFF, 0xFF, 0xFF, b'a', b'r', b't',
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(table.finish(), expected.to_vec());

        Ok(())
    }

    #[test]
    fn long_strings_split_into_chained_chunks() -> Result<()> {
        let path = (0..300).map(|i| (b'a' + (i % 26) as u8) as char).collect::<String>();

        let mut table = CompressedStringTable::new();
        let reference = table.add(&path)?;
        assert_eq!(table.entry_count(), 3);
        assert_eq!(reference.length, 46);
        assert_eq!(reference.offset, 2 * (4 + 127));

        let buffer = table.finish();
        let cursor = ByteCursor::new(&buffer);

        let second: StringRef = cursor.read_record_at(reference.offset as usize)?;
        assert_eq!(second.offset, 4 + 127);
        assert_eq!(second.length, 127);
        let first: StringRef = cursor.read_record_at(second.offset as usize)?;
        assert_eq!(first.offset, 0);
        let end: StringRef = cursor.read_record_at(first.offset as usize)?;
        assert!(end.is_none());

        let mut resolver = StringResolver::new(cursor.clone(), 0);
        assert_eq!(resolver.resolve(reference)?, path);

        Ok(())
    }

    #[test]
    fn resolve_shared_prefix_chain() -> Result<()> {
        // "data/" literal, then "win32" extending its full text, then "ui" extending
        // the first four bytes of "win32"
        #[rustfmt::skip]
        let buffer = [
            0xFF, 0xFF, 0xFF, 0xFF, b'd', b'a', b't', b'a', b'/',
            0x00, 0x00, 0x00, 0x05, b'w', b'i', b'n', b'3', b'2',
            0x09, 0x00, 0x00, 0x04, b'u', b'i',
        ];
        let cursor = ByteCursor::new(&buffer);
        let mut resolver = StringResolver::new(cursor.clone(), 0);

        let win32 = StringRef { offset: 9, identifier: 0, length: 5 };
        let ui = StringRef { offset: 18, identifier: 0, length: 2 };

        assert_eq!(resolver.resolve(ui)?, "data/win3ui");
        assert_eq!(resolver.resolve(win32)?, "data/win32");
        assert_eq!(resolver.resolve(StringRef::EMPTY)?, "");

        Ok(())
    }

    #[test]
    fn cyclic_chain_is_rejected() {
        #[rustfmt::skip]
        let buffer = [
            0x00, 0x00, 0x80, 0x01, b'a',
        ];
        let cursor = ByteCursor::new(&buffer);
        let mut resolver = StringResolver::new(cursor.clone(), 0);

        let result = resolver.resolve(StringRef {
            offset: 0,
            identifier: StringRef::LITERAL,
            length: 1,
        });
        assert!(matches!(result, Err(Error::InvalidStringReference(0))));
    }

    #[test]
    fn table_past_the_address_space_is_out_of_bounds() {
        let buffer = [0u8; 8];
        let mut resolver = StringResolver::new(ByteCursor::new(&buffer), usize::MAX - 2);

        let result = resolver.resolve(StringRef {
            offset: 1,
            identifier: StringRef::LITERAL,
            length: 1,
        });
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn non_ascii_case_variants_share_an_entry() -> Result<()> {
        let mut table = CompressedStringTable::new();
        let upper = table.add("data/\u{c0}udio")?;
        let lower = table.add("data/\u{e0}udio")?;

        assert_eq!(upper, lower);
        assert_eq!(table.entry_count(), 1);
        Ok(())
    }

    #[test]
    fn table_overflow() {
        let mut table = CompressedStringTable::new();
        let chunk = "x".repeat(120);
        let result = (0..400).try_for_each(|i| table.add(&format!("{chunk}{i}")).map(|_| ()));
        assert!(matches!(result, Err(Error::StringTableOverflow(_))));
    }
}
