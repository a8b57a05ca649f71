//! Decoding of BRT resources
//!

use std::io::Read;

use tracing::{debug, instrument, warn};

use crate::cursor::{ByteCursor, Record};
use crate::document::{BrtDocument, BrtFormat};
use crate::error::Result;
use crate::types::OuterHeader;
use crate::variant::{CompressedTable, PointerTable, TableCodec};

/// Decode a complete resource, outer header included, as the given format variant
///
/// ```no_run
/// use brt_table::document::BrtFormat;
///
/// fn table_name(path: &str) -> brt_table::error::Result<String> {
///     let data = std::fs::read(path)?;
///     let document = brt_table::read::decode(&data, BrtFormat::Guid)?;
///     Ok(document.table_name)
/// }
/// ```
#[instrument(level = "debug", skip(data), fields(size = data.len()), err)]
pub fn decode(data: &[u8], format: BrtFormat) -> Result<BrtDocument> {
    let mut cursor = ByteCursor::new(data);
    let header: OuterHeader = cursor.read_record()?;

    let body = cursor.read_at(OuterHeader::SIZE, header.section_length as usize)?;
    let relocations = cursor.read_at(
        OuterHeader::SIZE + body.len(),
        header.relocation_length as usize,
    )?;

    debug!(
        section_length = header.section_length,
        relocations = relocations.len() / 4,
        "outer header"
    );
    if relocations.len() % 4 != 0 {
        warn!(
            "relocation table length {} is not a multiple of 4",
            relocations.len()
        );
    }

    let mut body = ByteCursor::new(body);
    match format {
        BrtFormat::NoGuid | BrtFormat::Guid => PointerTable::decode(&mut body, format),
        BrtFormat::CompressedStrings => CompressedTable::decode(&mut body, format),
    }
}

impl BrtDocument {
    /// Read a resource to its end and decode it
    pub fn read<R: Read>(mut reader: R, format: BrtFormat) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        decode(&data, format)
    }
}
