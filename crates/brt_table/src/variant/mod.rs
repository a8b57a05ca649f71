//! Per-variant layouts of the table body.
//!
//! Each variant owns its header layout, section order and pointer arithmetic. Decoding and
//! encoding both work on an isolated context so nothing is shared between calls.

pub mod compressed;
pub mod pointer;

use tracing::warn;

use crate::cursor::ByteCursor;
use crate::document::{AssetRef, BrtDocument, BrtFormat, BundleRef};
use crate::error::{Error, Result, UnresolvedReference};
use crate::reloc::RelocationTable;

pub use compressed::CompressedTable;
pub use pointer::PointerTable;

/// An encoded table body and the pointer locations inside it
#[derive(Debug, Clone, Default)]
pub struct EncodedTable {
    pub body: Vec<u8>,
    pub relocations: RelocationTable,
}

/// Codec for one family of format variants
pub trait TableCodec {
    /// Decode a table body. Pointers are relative to the start of `cursor`.
    fn decode(cursor: &mut ByteCursor<'_>, format: BrtFormat) -> Result<BrtDocument>;

    /// Encode a document into a table body
    fn encode(document: &BrtDocument) -> Result<EncodedTable>;
}

/// Convert a stored pointer to a buffer offset
pub(crate) fn to_offset(pointer: u64, size: usize) -> Result<usize> {
    usize::try_from(pointer).map_err(|_| Error::OutOfBounds {
        offset: usize::MAX,
        length: 0,
        size,
    })
}

/// Offset of record `index` in a section of `size` byte records
pub(crate) fn record_base(section: u64, index: usize, size: usize, buffer: usize) -> Result<usize> {
    index
        .checked_mul(size)
        .and_then(|relative| to_offset(section, buffer).ok()?.checked_add(relative))
        .ok_or(Error::OutOfBounds {
            offset: usize::MAX,
            length: size,
            size: buffer,
        })
}

/// Log the string that is expected to be empty when it is not
pub(crate) fn check_empty_string(cursor: &ByteCursor<'_>, pointer: u64) -> Result<()> {
    let value = cursor.read_null_terminated_string(to_offset(pointer, cursor.len())?)?;
    if !value.is_empty() {
        warn!(
            "unexpected table layout, expected an empty string at {:#x} but got {:?}",
            pointer, value
        );
    }
    Ok(())
}

fn in_range(index: i32, len: usize) -> bool {
    usize::try_from(index).is_ok_and(|index| index < len)
}

/// Check every record matches the document format and every index resolves
pub(crate) fn validate(document: &BrtDocument) -> Result<()> {
    let format = document.format;

    if format.has_guid() && document.instance_guid.is_none() {
        return Err(Error::MissingInstanceGuid);
    }

    if !format.is_indexed() {
        if !document.bundles.is_empty() {
            return Err(Error::VariantMismatch("bundle"));
        }
        if !document.assets.is_empty() {
            return Err(Error::VariantMismatch("asset"));
        }
    }

    for bundle_ref in &document.bundle_refs {
        match bundle_ref {
            BundleRef::Indexed { bundle_index, .. } if format.is_indexed() => {
                if !in_range(*bundle_index, document.bundles.len()) {
                    return Err(UnresolvedReference::Bundle(*bundle_index).into());
                }
            }
            BundleRef::Path { .. } if !format.is_indexed() => {}
            _ => return Err(Error::VariantMismatch("bundle ref")),
        }
    }

    for lookup in &document.asset_lookups {
        if !in_range(lookup.bundle_ref_index, document.bundle_refs.len()) {
            return Err(UnresolvedReference::BundleRef(lookup.bundle_ref_index).into());
        }
        match &lookup.asset {
            AssetRef::ByIndex(index) if format.is_indexed() => {
                if !in_range(*index, document.assets.len()) {
                    return Err(UnresolvedReference::Asset(*index).into());
                }
            }
            AssetRef::ByPath(_) if !format.is_indexed() => {}
            _ => return Err(Error::VariantMismatch("asset lookup")),
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::document::{
        Asset, AssetLookup, AssetRef, BrtDocument, BrtFormat, Bundle, BundleRef,
    };
    use crate::error::{Error, UnresolvedReference};
    use crate::guid::Guid;
    use crate::variant::validate;

    fn indexed() -> BrtDocument {
        BrtDocument::builder()
            .table_name("ui")
            .format(BrtFormat::NoGuid)
            .bundles(vec![Bundle {
                name: "ui".into(),
                parent_index: 0,
            }])
            .bundle_refs(vec![BundleRef::indexed("ui", "win32", 0)])
            .assets(vec![Asset::new("foo.tex", "art")])
            .asset_lookups(vec![AssetLookup::new(1, 0, AssetRef::ByIndex(0))])
            .build()
    }

    #[test]
    fn accept_consistent_document() {
        assert!(validate(&indexed()).is_ok());
    }

    #[test]
    fn guid_format_needs_guid() {
        let mut document = indexed();
        document.format = BrtFormat::Guid;
        assert!(matches!(validate(&document), Err(Error::MissingInstanceGuid)));

        document.instance_guid = Some(Guid::default());
        assert!(validate(&document).is_ok());
    }

    #[test]
    fn reject_dangling_indices() {
        let mut document = indexed();
        document.asset_lookups[0].asset = AssetRef::ByIndex(1);
        assert!(matches!(
            validate(&document),
            Err(Error::UnresolvedReference(UnresolvedReference::Asset(1)))
        ));

        let mut document = indexed();
        document.asset_lookups[0].bundle_ref_index = -1;
        assert!(matches!(
            validate(&document),
            Err(Error::UnresolvedReference(UnresolvedReference::BundleRef(-1)))
        ));

        let mut document = indexed();
        document.bundle_refs[0] = BundleRef::indexed("ui", "win32", 3);
        assert!(matches!(
            validate(&document),
            Err(Error::UnresolvedReference(UnresolvedReference::Bundle(3)))
        ));
    }

    #[test]
    fn parent_index_is_not_checked() {
        let mut document = indexed();
        document.bundles[0].parent_index = -6;
        assert!(validate(&document).is_ok());
    }

    #[test]
    fn reject_mismatched_shapes() {
        let mut document = indexed();
        document.bundle_refs[0] = BundleRef::path("win32/ui", -1);
        assert!(matches!(validate(&document), Err(Error::VariantMismatch(_))));

        let mut document = indexed();
        document.format = BrtFormat::CompressedStrings;
        document.instance_guid = Some(Guid::default());
        assert!(matches!(validate(&document), Err(Error::VariantMismatch("bundle"))));
    }
}
