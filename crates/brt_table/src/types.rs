//! Base on-disk records of a BRT resource.
//!
//! Every record is little-endian. Pointers are absolute offsets from the start of the table body,
//! which begins immediately after the [`OuterHeader`].

use binrw::{BinRead, BinWrite};

use crate::cursor::Record;

/// Envelope shared by every format variant
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct OuterHeader {
    /// Length of the table body, excluding the relocation table
    pub section_length: u32,

    /// Length in bytes of the trailing relocation table
    pub relocation_length: u32,

    pub reserved: [u8; 8],
}

impl Record for OuterHeader {
    const SIZE: usize = 0x10;
}

/// Leading pointers of the NoGuid and Guid headers
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct SectionPointers {
    /// Name of the table
    pub name: u64,
    pub asset_lookups: u64,
    pub bundle_refs: u64,
    pub assets: u64,
    pub bundles: u64,
    /// Expected to point at an empty string
    pub empty: u64,
}

impl Record for SectionPointers {
    const SIZE: usize = 0x30;
}

/// Instance GUID block present only in the Guid header
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct GuidBlock {
    pub guid: [u8; 16],
    pub reserved: [u8; 16],
}

impl Record for GuidBlock {
    const SIZE: usize = 0x20;
}

/// Trailing counts of the NoGuid and Guid headers
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct TableCounts {
    pub asset_lookups: u32,
    pub bundle_refs: u32,
    pub assets: u32,
    #[allow(dead_code)]
    pub zero_a: u32,
    /// Opaque value kept verbatim
    pub unknown_hash: u32,
    #[allow(dead_code)]
    pub zero_b: u32,
    /// Always 1
    pub one: u32,
    #[allow(dead_code)]
    pub zero_c: u32,
}

impl Default for TableCounts {
    fn default() -> Self {
        Self {
            asset_lookups: 0,
            bundle_refs: 0,
            assets: 0,
            zero_a: 0,
            unknown_hash: 0,
            zero_b: 0,
            one: 1,
            zero_c: 0,
        }
    }
}

impl Record for TableCounts {
    const SIZE: usize = 0x20;
}

/// Bundle reference record of the NoGuid and Guid variants
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct BundleRefRecord {
    pub name: u64,
    pub directory: u64,
    /// Pointer into the bundle section
    pub bundle: u64,
}

impl Record for BundleRefRecord {
    const SIZE: usize = 0x18;
}

/// Asset record of the NoGuid and Guid variants
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct AssetRecord {
    pub name: u64,
    pub path: u64,
}

impl Record for AssetRecord {
    const SIZE: usize = 0x10;
}

/// Asset lookup record of the NoGuid and Guid variants
///
/// The hash is kept as the little-endian numeric value of its eight on-disk bytes, so writing it
/// back little-endian restores the exact bytes.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct AssetLookupRecord {
    pub hash: u64,
    pub bundle_ref_index: i32,
    pub asset_index: i32,
}

impl Record for AssetLookupRecord {
    const SIZE: usize = 0x10;
}

/// Bundle record of the NoGuid and Guid variants
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct BundleRecord {
    pub name: u64,
    /// Pointer into the bundle section
    pub parent: u64,
}

impl Record for BundleRecord {
    const SIZE: usize = 0x10;
}

/// Header of the CompressedStrings variant
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct CompressedHeader {
    pub name: u64,
    pub asset_lookups: u64,
    pub bundle_refs: u64,
    pub string_table: u64,
    /// Expected to point at an empty string
    pub empty: u64,
    pub guid: [u8; 16],
    pub asset_lookup_count: u32,
    pub bundle_ref_count: u32,
    /// Number of entries in the string table
    pub string_count: u32,
    /// Opaque value kept verbatim
    pub unknown_hash: u32,
    /// Always 1
    pub one: u32,
    #[allow(dead_code)]
    pub zero: u32,
}

impl Default for CompressedHeader {
    fn default() -> Self {
        Self {
            name: 0,
            asset_lookups: 0,
            bundle_refs: 0,
            string_table: 0,
            empty: 0,
            guid: [0; 16],
            asset_lookup_count: 0,
            bundle_ref_count: 0,
            string_count: 0,
            unknown_hash: 0,
            one: 1,
            zero: 0,
        }
    }
}

impl Record for CompressedHeader {
    const SIZE: usize = 0x50;
}

/// Compact reference into the CompressedStrings string table
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct StringRef {
    /// Offset of the entry from the start of the string table, `-1` for none
    pub offset: i16,
    /// `0x80` for a literal span
    pub identifier: u8,
    /// Number of text bytes of the entry to use
    pub length: u8,
}

impl StringRef {
    /// Identifier written for every span this library emits
    pub const LITERAL: u8 = 0x80;

    /// Longest span a single entry holds
    pub const MAX_LENGTH: usize = 127;

    /// Base marker of an entry that stands on its own (`0xFFFFFFFF`)
    pub const NONE: StringRef = StringRef {
        offset: -1,
        identifier: 0xFF,
        length: 0xFF,
    };

    /// Reference to the empty string
    pub const EMPTY: StringRef = StringRef {
        offset: -1,
        identifier: 0,
        length: 0,
    };

    pub fn is_none(&self) -> bool {
        self.offset < 0
    }
}

impl Record for StringRef {
    const SIZE: usize = 4;
}

/// Bundle reference record of the CompressedStrings variant
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct CompressedBundleRefRecord {
    pub path: StringRef,
    pub parent_index: i32,
}

impl Record for CompressedBundleRefRecord {
    const SIZE: usize = 8;
}

/// Asset lookup record of the CompressedStrings variant
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct CompressedLookupRecord {
    pub hash: u64,
    pub bundle_ref_index: i32,
    pub path: StringRef,
    pub reserved: [u8; 16],
}

impl Record for CompressedLookupRecord {
    const SIZE: usize = 0x20;
}
