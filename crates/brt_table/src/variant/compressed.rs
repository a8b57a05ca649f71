//! CompressedStrings layout.
//!
//! | Offset | Content                                                           |
//! |--------|-------------------------------------------------------------------|
//! | `0x00` | Pointers to the name, lookups, bundle refs, string table and empty string |
//! | `0x28` | Instance GUID                                                     |
//! | `0x38` | Lookup count, bundle ref count, string entry count, opaque hash, `1`, `0` |
//! | `0x50` | Table name and empty string, zero terminated                      |
//!
//! The string table, the bundle refs and the asset lookups follow, each starting on a 16 byte
//! boundary. Bundle refs and lookups carry no pointers; every path is a [`StringRef`] into the
//! string table, and lookups name their asset by path instead of by index.

use std::io::{Cursor, Write};

use binrw::BinWrite;
use tracing::{debug, instrument};

use crate::cursor::{ByteCursor, Record};
use crate::document::{AssetLookup, AssetRef, BrtDocument, BrtFormat, BundleRef};
use crate::error::{Error, Result};
use crate::guid::Guid;
use crate::reloc::RelocationTable;
use crate::strings::{align, CompressedStringTable, StringResolver, StringTableBuilder};
use crate::types::{CompressedBundleRefRecord, CompressedHeader, CompressedLookupRecord};
use crate::variant::{check_empty_string, record_base, to_offset, validate, EncodedTable, TableCodec};

const HEADER_POINTERS: [u64; 5] = [0x00, 0x08, 0x10, 0x18, 0x20];

/// Codec for the `CompressedStrings` variant
pub struct CompressedTable;

fn count(length: usize) -> Result<u32> {
    u32::try_from(length).map_err(|_| Error::CustomError(format!("{length} records do not fit a u32 count")))
}

impl TableCodec for CompressedTable {
    #[instrument(level = "debug", skip(cursor))]
    fn decode(cursor: &mut ByteCursor<'_>, format: BrtFormat) -> Result<BrtDocument> {
        cursor.seek(0);
        let header: CompressedHeader = cursor.read_record()?;
        let size = cursor.len();

        let table_name = cursor.read_null_terminated_string(to_offset(header.name, size)?)?;
        check_empty_string(cursor, header.empty)?;

        debug!(
            %table_name,
            asset_lookups = header.asset_lookup_count,
            bundle_refs = header.bundle_ref_count,
            strings = header.string_count,
            "header"
        );

        let mut strings = StringResolver::new(cursor.clone(), to_offset(header.string_table, size)?);

        let mut bundle_refs = Vec::new();
        for index in 0..header.bundle_ref_count as usize {
            let offset = record_base(header.bundle_refs, index, CompressedBundleRefRecord::SIZE, size)?;
            let record: CompressedBundleRefRecord = cursor.read_record_at(offset)?;
            bundle_refs.push(BundleRef::Path {
                path: strings.resolve(record.path)?,
                parent_index: record.parent_index,
            });
        }

        let mut asset_lookups = Vec::new();
        for index in 0..header.asset_lookup_count as usize {
            let offset = record_base(header.asset_lookups, index, CompressedLookupRecord::SIZE, size)?;
            let record: CompressedLookupRecord = cursor.read_record_at(offset)?;
            asset_lookups.push(AssetLookup::new(
                record.hash,
                record.bundle_ref_index,
                AssetRef::ByPath(strings.resolve(record.path)?),
            ));
        }

        Ok(BrtDocument {
            table_name,
            format,
            instance_guid: Some(Guid::new(header.guid)),
            unknown_hash: header.unknown_hash,
            bundles: Vec::new(),
            bundle_refs,
            assets: Vec::new(),
            asset_lookups,
        })
    }

    #[instrument(level = "debug", skip_all, fields(table_name = %document.table_name))]
    fn encode(document: &BrtDocument) -> Result<EncodedTable> {
        validate(document)?;
        let guid = document.instance_guid.ok_or(Error::MissingInstanceGuid)?;

        let mut names = StringTableBuilder::new(CompressedHeader::SIZE as u64);
        let name = names.add(&document.table_name);
        let empty = names.add("");
        let (name_block, _) = names.finish();

        let mut lookups: Vec<&AssetLookup> = document.asset_lookups.iter().collect();
        lookups.sort_by_key(|lookup| lookup.hash);

        let mut strings = CompressedStringTable::new();
        let mut bundle_ref_records = Vec::with_capacity(document.bundle_refs.len());
        for bundle_ref in &document.bundle_refs {
            let BundleRef::Path { path, parent_index } = bundle_ref else {
                return Err(Error::VariantMismatch("bundle ref"));
            };
            bundle_ref_records.push(CompressedBundleRefRecord {
                path: strings.add(path)?,
                parent_index: *parent_index,
            });
        }

        let mut lookup_records = Vec::with_capacity(lookups.len());
        for lookup in lookups {
            let AssetRef::ByPath(path) = &lookup.asset else {
                return Err(Error::VariantMismatch("asset lookup"));
            };
            lookup_records.push(CompressedLookupRecord {
                hash: lookup.hash,
                bundle_ref_index: lookup.bundle_ref_index,
                path: strings.add(path)?,
                reserved: [0; 16],
            });
        }

        let string_count = strings.entry_count();
        let string_block = strings.finish();

        let string_table = CompressedHeader::SIZE + name_block.len();
        let bundle_refs = string_table + string_block.len();
        let bundle_ref_block = align(bundle_ref_records.len() * CompressedBundleRefRecord::SIZE, 16);
        let asset_lookups = bundle_refs + bundle_ref_block;

        let mut writer = Cursor::new(Vec::new());

        CompressedHeader {
            name,
            asset_lookups: asset_lookups as u64,
            bundle_refs: bundle_refs as u64,
            string_table: string_table as u64,
            empty,
            guid: guid.to_bytes(),
            asset_lookup_count: count(lookup_records.len())?,
            bundle_ref_count: count(bundle_ref_records.len())?,
            string_count,
            unknown_hash: document.unknown_hash,
            ..Default::default()
        }
        .write(&mut writer)?;

        writer.write_all(&name_block)?;
        writer.write_all(&string_block)?;

        for record in &bundle_ref_records {
            record.write(&mut writer)?;
        }
        let padding = bundle_ref_block - bundle_ref_records.len() * CompressedBundleRefRecord::SIZE;
        writer.write_all(&vec![0; padding])?;

        for record in &lookup_records {
            record.write(&mut writer)?;
        }

        let mut relocations = RelocationTable::new();
        for pointer in HEADER_POINTERS {
            relocations.push(pointer)?;
        }

        Ok(EncodedTable {
            body: writer.into_inner(),
            relocations,
        })
    }
}
