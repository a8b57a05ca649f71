//! This library reads and writes the **Bundle Reference Table** (BRT) resources that map asset
//! hashes to the bundles providing them.
//!
//! # BRT Resource Format
//!
//! A table is decoded into a [`BrtDocument`] in which every relationship is a plain list index.
//! Encoding recomputes every pointer, packs the strings again and rebuilds the relocation table,
//! so a document can be edited freely between the two.
//!
//! ## Envelope
//!
//! Every variant shares a 16 byte outer header followed by the table body and a relocation table.
//!
//! | Offset (bytes) | Field             | Description                                          |
//! |----------------|-------------------|------------------------------------------------------|
//! | 0x0000         | Section Length    | 4 bytes: Length of the table body                    |
//! | 0x0004         | Relocation Length | 4 bytes: Length of the relocation table in bytes     |
//! | 0x0008         | Reserved          | 8 bytes: Zero                                        |
//! | 0x0010         | Body              | Variant specific header and sections                 |
//!
//! All pointers inside the body are absolute offsets from the start of the body. The relocation
//! table lists, as `u32` offsets, every body location that holds such a pointer so the engine can
//! rebase them after loading.
//!
//! ## Variants
//!
//! | Tag | Variant             | Header | Notes                                                  |
//! |-----|---------------------|--------|--------------------------------------------------------|
//! | 0   | `NoGuid`            | 0x50   | Pointer based, zero terminated string block            |
//! | 1   | `Guid`              | 0x70   | As `NoGuid` with an instance GUID in the header        |
//! | 2   | `CompressedStrings` | 0x50   | Path keyed records and a back-referencing string table |
//!
//! The pointer based variants store these records after the string block:
//!
//! | Record       | Size | Fields                                                        |
//! |--------------|------|---------------------------------------------------------------|
//! | Bundle ref   | 0x18 | name pointer, directory pointer, bundle pointer               |
//! | Asset        | 0x10 | name pointer, path pointer                                    |
//! | Asset lookup | 0x10 | 8 hash bytes, bundle ref index (`i32`), asset index (`i32`)   |
//! | Bundle       | 0x10 | name pointer, parent bundle pointer                           |
//!
//! The `CompressedStrings` variant has no assets or bundles. Its bundle refs (8 bytes) and asset
//! lookups (0x20 bytes) name their paths through 4 byte [`types::StringRef`]s into the string
//! table, where an entry may extend the prefix of an earlier one.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Strings**: One byte per character
//! - **Asset lookups**: Always written in ascending hash order
//!
//! ```
//! use brt_table::{BrtDocument, BrtFormat, BundleRef};
//!
//! let document = BrtDocument::builder()
//!     .table_name("ui")
//!     .format(BrtFormat::NoGuid)
//!     .bundles(vec![brt_table::document::Bundle { name: "ui".into(), parent_index: 0 }])
//!     .bundle_refs(vec![BundleRef::indexed("ui", "win32", 0)])
//!     .build();
//!
//! let mut data = Vec::new();
//! document.write(&mut data).unwrap();
//!
//! let decoded = BrtDocument::read(data.as_slice(), BrtFormat::NoGuid).unwrap();
//! assert_eq!(decoded, document);
//! ```

pub mod cursor;
pub mod document;
pub mod edit;
pub mod error;
pub mod game;
pub mod guid;
pub mod hash;
pub mod read;
pub mod reloc;
#[cfg(feature = "polars")]
pub mod sheet;
pub mod strings;
pub mod types;
pub mod variant;
pub mod write;

pub use document::{Asset, AssetLookup, AssetRef, BrtDocument, BrtFormat, Bundle, BundleRef};
pub use edit::{import_duplicates, merge, DuplicatePair, ImportReport, MergeReport};
pub use game::Game;
pub use guid::Guid;
pub use read::decode;
pub use write::encode;
