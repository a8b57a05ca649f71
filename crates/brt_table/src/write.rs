//! Encoding of BRT resources
//!

use std::io::{Cursor, Write};

use binrw::BinWrite;
use tracing::{debug, instrument};

use crate::cursor::Record;
use crate::document::{BrtDocument, BrtFormat};
use crate::error::{Error, Result};
use crate::types::OuterHeader;
use crate::variant::{CompressedTable, EncodedTable, PointerTable, TableCodec};

/// Encode a document into a complete resource: outer header, table body and relocation table
///
/// Asset lookups are written in ascending hash order regardless of their order in the document.
///
/// ```
/// use brt_table::document::{BrtDocument, BrtFormat};
///
/// let document = BrtDocument::builder()
///     .table_name("empty")
///     .format(BrtFormat::NoGuid)
///     .build();
///
/// let data = brt_table::write::encode(&document).unwrap();
/// assert_eq!(brt_table::read::decode(&data, BrtFormat::NoGuid).unwrap(), document);
/// ```
#[instrument(level = "debug", skip_all, fields(table_name = %document.table_name, format = %document.format), err)]
pub fn encode(document: &BrtDocument) -> Result<Vec<u8>> {
    let EncodedTable { body, relocations } = match document.format {
        BrtFormat::NoGuid | BrtFormat::Guid => PointerTable::encode(document)?,
        BrtFormat::CompressedStrings => CompressedTable::encode(document)?,
    };

    let header = OuterHeader {
        section_length: u32::try_from(body.len())
            .map_err(|_| Error::CustomError(format!("table body of {} bytes is too large", body.len())))?,
        relocation_length: relocations.byte_len() as u32,
        ..Default::default()
    };

    debug!(
        section_length = header.section_length,
        relocations = relocations.len(),
        "outer header"
    );

    let mut writer = Cursor::new(Vec::with_capacity(
        OuterHeader::SIZE + body.len() + relocations.byte_len(),
    ));
    header.write(&mut writer)?;
    writer.write_all(&body)?;
    relocations.write(&mut writer)?;

    Ok(writer.into_inner())
}

impl BrtDocument {
    /// Encode the document and write it out
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&encode(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::document::{BrtDocument, BrtFormat};
    use crate::error::Result;
    use crate::write::encode;

    #[test]
    fn empty_table_envelope() -> Result<()> {
        let document = BrtDocument::builder()
            .table_name("abcdefghijk")
            .format(BrtFormat::NoGuid)
            .build();

        let data = encode(&document)?;

        // Header, 13 string bytes padded to 16, six header pointers
        #[rustfmt::skip]
        let envelope = [
            0x60, 0x00, 0x00, 0x00,
            0x18, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(&data[..16], &envelope);
        assert_eq!(data.len(), 0x10 + 0x60 + 0x18);
        assert_eq!(&data[0x60..0x6D], b"abcdefghijk\0\0");

        Ok(())
    }
}
