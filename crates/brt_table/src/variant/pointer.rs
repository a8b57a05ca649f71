//! NoGuid and Guid layouts.
//!
//! Both variants share every section and differ only by the GUID block in the header:
//!
//! | Offset   | Content                                                  |
//! |----------|----------------------------------------------------------|
//! | `0x00`   | Section pointers (name, lookups, bundle refs, assets, bundles, empty string) |
//! | `0x30`   | GUID and 16 reserved bytes (`Guid` only)                 |
//! | `H-0x20` | Counts, opaque hash and the constant `1`                 |
//! | `H`      | String block, `0x50` for `NoGuid` and `0x70` for `Guid`  |
//!
//! Sections follow the string block in the order bundle refs, assets, asset lookups, bundles.
//! Records point at each other, so indices are recovered by dividing the distance from the
//! start of the target section by the record size.

use std::io::{Cursor, Write};

use binrw::BinWrite;
use tracing::{debug, instrument};

use crate::cursor::{ByteCursor, Record};
use crate::document::{Asset, AssetLookup, AssetRef, BrtDocument, BrtFormat, Bundle, BundleRef};
use crate::error::{Error, Result};
use crate::guid::Guid;
use crate::reloc::RelocationTable;
use crate::strings::StringTableBuilder;
use crate::types::{
    AssetLookupRecord, AssetRecord, BundleRecord, BundleRefRecord, GuidBlock, SectionPointers,
    TableCounts,
};
use crate::variant::{check_empty_string, record_base, to_offset, validate, EncodedTable, TableCodec};

const HEADER_POINTERS: [u64; 6] = [0x00, 0x08, 0x10, 0x18, 0x20, 0x28];

/// Codec for the pointer based `NoGuid` and `Guid` variants
pub struct PointerTable;

impl PointerTable {
    /// Size of the header, which is also where the string block starts
    pub fn header_size(format: BrtFormat) -> usize {
        let guid = if format.has_guid() { GuidBlock::SIZE } else { 0 };
        SectionPointers::SIZE + guid + TableCounts::SIZE
    }
}

/// Index of the record `pointer` addresses in the section starting at `base`
fn index_of(pointer: u64, base: u64, size: usize) -> Result<i32> {
    let distance = pointer as i64 as i128 - base as i64 as i128;
    let index = distance.div_euclid(size as i128);
    i32::try_from(index).map_err(|_| {
        Error::CustomError(format!(
            "pointer {pointer:#x} is too far from the section at {base:#x}"
        ))
    })
}

/// Pointer to record `index` of the section starting at `base`
fn pointer_to(index: i32, base: u64, size: usize) -> u64 {
    (base as i64).wrapping_add(index as i64 * size as i64) as u64
}

fn count(length: usize) -> Result<u32> {
    u32::try_from(length).map_err(|_| Error::CustomError(format!("{length} records do not fit a u32 count")))
}

impl TableCodec for PointerTable {
    #[instrument(level = "debug", skip(cursor))]
    fn decode(cursor: &mut ByteCursor<'_>, format: BrtFormat) -> Result<BrtDocument> {
        cursor.seek(0);
        let pointers: SectionPointers = cursor.read_record()?;
        let instance_guid = if format.has_guid() {
            let block: GuidBlock = cursor.read_record()?;
            Some(Guid::new(block.guid))
        } else {
            None
        };
        let counts: TableCounts = cursor.read_record()?;
        let size = cursor.len();

        let table_name = cursor.read_null_terminated_string(to_offset(pointers.name, size)?)?;
        check_empty_string(cursor, pointers.empty)?;

        debug!(
            %table_name,
            asset_lookups = counts.asset_lookups,
            bundle_refs = counts.bundle_refs,
            assets = counts.assets,
            "header"
        );

        let mut bundle_refs = Vec::new();
        for index in 0..counts.bundle_refs as usize {
            let offset = record_base(pointers.bundle_refs, index, BundleRefRecord::SIZE, size)?;
            let record: BundleRefRecord = cursor.read_record_at(offset)?;
            bundle_refs.push(BundleRef::Indexed {
                name: cursor.read_null_terminated_string(to_offset(record.name, size)?)?,
                directory: cursor.read_null_terminated_string(to_offset(record.directory, size)?)?,
                bundle_index: index_of(record.bundle, pointers.bundles, BundleRecord::SIZE)?,
            });
        }

        let mut assets = Vec::new();
        for index in 0..counts.assets as usize {
            let offset = record_base(pointers.assets, index, AssetRecord::SIZE, size)?;
            let record: AssetRecord = cursor.read_record_at(offset)?;
            assets.push(Asset {
                name: cursor.read_null_terminated_string(to_offset(record.name, size)?)?,
                path: cursor.read_null_terminated_string(to_offset(record.path, size)?)?,
            });
        }

        let mut asset_lookups = Vec::new();
        for index in 0..counts.asset_lookups as usize {
            let offset = record_base(pointers.asset_lookups, index, AssetLookupRecord::SIZE, size)?;
            let record: AssetLookupRecord = cursor.read_record_at(offset)?;
            asset_lookups.push(AssetLookup::new(
                record.hash,
                record.bundle_ref_index,
                AssetRef::ByIndex(record.asset_index),
            ));
        }

        // The header has no bundle count, the highest referenced bundle bounds the section
        let bundle_count = bundle_refs
            .iter()
            .filter_map(|bundle_ref| match bundle_ref {
                BundleRef::Indexed { bundle_index, .. } => usize::try_from(*bundle_index).ok(),
                BundleRef::Path { .. } => None,
            })
            .max()
            .map_or(0, |highest| highest + 1);

        let mut bundles = Vec::with_capacity(bundle_count);
        for index in 0..bundle_count {
            let offset = record_base(pointers.bundles, index, BundleRecord::SIZE, size)?;
            let record: BundleRecord = cursor.read_record_at(offset)?;
            bundles.push(Bundle {
                name: cursor.read_null_terminated_string(to_offset(record.name, size)?)?,
                parent_index: index_of(record.parent, pointers.bundles, BundleRecord::SIZE)?,
            });
        }

        Ok(BrtDocument {
            table_name,
            format,
            instance_guid,
            unknown_hash: counts.unknown_hash,
            bundles,
            bundle_refs,
            assets,
            asset_lookups,
        })
    }

    #[instrument(level = "debug", skip_all, fields(table_name = %document.table_name))]
    fn encode(document: &BrtDocument) -> Result<EncodedTable> {
        validate(document)?;

        let header_size = Self::header_size(document.format) as u64;

        let mut strings = StringTableBuilder::new(header_size);
        let name = strings.add(&document.table_name);
        let empty = strings.add("");

        let mut bundle_ref_strings = Vec::with_capacity(document.bundle_refs.len());
        for bundle_ref in &document.bundle_refs {
            if let BundleRef::Indexed {
                name,
                directory,
                bundle_index,
            } = bundle_ref
            {
                bundle_ref_strings.push((strings.add(name), strings.add(directory), *bundle_index));
            }
        }
        let asset_strings: Vec<_> = document
            .assets
            .iter()
            .map(|asset| (strings.add(&asset.name), strings.add(&asset.path)))
            .collect();
        let bundle_strings: Vec<_> = document
            .bundles
            .iter()
            .map(|bundle| (strings.add(&bundle.name), bundle.parent_index))
            .collect();

        let (string_block, _) = strings.finish();

        let bundle_refs_base = header_size + string_block.len() as u64;
        let assets_base = bundle_refs_base + (bundle_ref_strings.len() * BundleRefRecord::SIZE) as u64;
        let lookups_base = assets_base + (asset_strings.len() * AssetRecord::SIZE) as u64;
        let bundles_base = lookups_base + (document.asset_lookups.len() * AssetLookupRecord::SIZE) as u64;

        let mut writer = Cursor::new(Vec::new());

        SectionPointers {
            name,
            asset_lookups: lookups_base,
            bundle_refs: bundle_refs_base,
            assets: assets_base,
            bundles: bundles_base,
            empty,
        }
        .write(&mut writer)?;

        if let Some(guid) = document.instance_guid.filter(|_| document.format.has_guid()) {
            GuidBlock {
                guid: guid.to_bytes(),
                reserved: [0; 16],
            }
            .write(&mut writer)?;
        }

        TableCounts {
            asset_lookups: count(document.asset_lookups.len())?,
            bundle_refs: count(bundle_ref_strings.len())?,
            assets: count(asset_strings.len())?,
            unknown_hash: document.unknown_hash,
            ..Default::default()
        }
        .write(&mut writer)?;

        writer.write_all(&string_block)?;

        for (name, directory, bundle_index) in &bundle_ref_strings {
            BundleRefRecord {
                name: *name,
                directory: *directory,
                bundle: pointer_to(*bundle_index, bundles_base, BundleRecord::SIZE),
            }
            .write(&mut writer)?;
        }

        for (name, path) in &asset_strings {
            AssetRecord {
                name: *name,
                path: *path,
            }
            .write(&mut writer)?;
        }

        let mut lookups: Vec<&AssetLookup> = document.asset_lookups.iter().collect();
        lookups.sort_by_key(|lookup| lookup.hash);
        for lookup in lookups {
            let asset_index = match lookup.asset {
                AssetRef::ByIndex(index) => index,
                AssetRef::ByPath(_) => return Err(Error::VariantMismatch("asset lookup")),
            };
            AssetLookupRecord {
                hash: lookup.hash,
                bundle_ref_index: lookup.bundle_ref_index,
                asset_index,
            }
            .write(&mut writer)?;
        }

        for (name, parent_index) in &bundle_strings {
            BundleRecord {
                name: *name,
                parent: pointer_to(*parent_index, bundles_base, BundleRecord::SIZE),
            }
            .write(&mut writer)?;
        }

        let mut relocations = RelocationTable::new();
        for pointer in HEADER_POINTERS {
            relocations.push(pointer)?;
        }
        relocations.push_records(
            bundle_refs_base,
            bundle_ref_strings.len(),
            BundleRefRecord::SIZE as u64,
            &[0x00, 0x08, 0x10],
        )?;
        relocations.push_records(assets_base, asset_strings.len(), AssetRecord::SIZE as u64, &[0x00, 0x08])?;
        relocations.push_records(bundles_base, bundle_strings.len(), BundleRecord::SIZE as u64, &[0x00, 0x08])?;

        Ok(EncodedTable {
            body: writer.into_inner(),
            relocations,
        })
    }
}
