//! The decoded, engine independent form of a bundle reference table.
//!
//! Every relationship the engine stores as a pointer is held here as a plain list index; pointer
//! arithmetic only happens inside the format codecs.

use std::fmt;
use std::str::FromStr;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::guid::Guid;
use crate::hash::{hex_hash, parse_hash, parse_hex_hash};

/// On-disk layout variant of a table
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BrtFormat {
    /// Pointer based layout with a 0x50 byte header
    NoGuid = 0,
    /// Pointer based layout with a 0x70 byte header carrying an instance GUID
    Guid = 1,
    /// Path keyed layout with a packed, back-referencing string table
    CompressedStrings = 2,
}

impl BrtFormat {
    /// Whether records reference each other by list index (`NoGuid` and `Guid`)
    pub fn is_indexed(&self) -> bool {
        !matches!(self, BrtFormat::CompressedStrings)
    }

    /// Whether the header carries an instance GUID
    pub fn has_guid(&self) -> bool {
        !matches!(self, BrtFormat::NoGuid)
    }
}

impl fmt::Display for BrtFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BrtFormat::NoGuid => "no guid",
            BrtFormat::Guid => "guid",
            BrtFormat::CompressedStrings => "compressed strings",
        })
    }
}

impl TryFrom<u32> for BrtFormat {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BrtFormat::NoGuid),
            1 => Ok(BrtFormat::Guid),
            2 => Ok(BrtFormat::CompressedStrings),
            other => Err(Error::UnsupportedFormat(other)),
        }
    }
}

impl FromStr for BrtFormat {
    type Err = Error;

    /// Accepts the kebab-case variant name or its numeric tag
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no-guid" | "noguid" | "0" => Ok(BrtFormat::NoGuid),
            "guid" | "1" => Ok(BrtFormat::Guid),
            "compressed-strings" | "compressedstrings" | "2" => Ok(BrtFormat::CompressedStrings),
            other => Err(Error::CustomError(format!(
                "unknown format {other:?}, expected no-guid, guid or compressed-strings"
            ))),
        }
    }
}

impl From<BrtFormat> for u32 {
    fn from(value: BrtFormat) -> Self {
        value as u32
    }
}

/// A bundle container, `NoGuid` and `Guid` only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(alias = "Name")]
    pub name: String,
    /// Index of the parent bundle, kept exactly as decoded
    #[serde(alias = "ParentBundleIndex")]
    pub parent_index: i32,
}

/// A reference to an installed bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleRef {
    /// `NoGuid` and `Guid` shape
    Indexed {
        #[serde(alias = "Name")]
        name: String,
        #[serde(alias = "Directory")]
        directory: String,
        /// Index into [`BrtDocument::bundles`]
        #[serde(alias = "BundleIndex")]
        bundle_index: i32,
    },
    /// `CompressedStrings` shape
    Path {
        #[serde(alias = "Path")]
        path: String,
        #[serde(alias = "ParentIndex")]
        parent_index: i32,
    },
}

impl BundleRef {
    pub fn indexed(name: impl Into<String>, directory: impl Into<String>, bundle_index: i32) -> Self {
        BundleRef::Indexed {
            name: name.into(),
            directory: directory.into(),
            bundle_index,
        }
    }

    pub fn path(path: impl Into<String>, parent_index: i32) -> Self {
        BundleRef::Path {
            path: path.into(),
            parent_index,
        }
    }
}

/// An asset entry, `NoGuid` and `Guid` only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Path")]
    pub path: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// How an asset lookup identifies its asset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// Index into [`BrtDocument::assets`]
    ByIndex(i32),
    /// Asset path, `CompressedStrings` only
    ByPath(String),
}

/// Hash keyed entry mapping an asset to the bundle ref that provides it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAssetLookup", into = "RawAssetLookup")]
pub struct AssetLookup {
    /// Little-endian numeric value of the eight on-disk hash bytes
    pub hash: u64,
    /// Index into [`BrtDocument::bundle_refs`]
    pub bundle_ref_index: i32,
    pub asset: AssetRef,
}

impl AssetLookup {
    pub fn new(hash: u64, bundle_ref_index: i32, asset: AssetRef) -> Self {
        Self {
            hash,
            bundle_ref_index,
            asset,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawAssetLookup {
    #[serde(alias = "Hash")]
    hash: String,
    #[serde(alias = "HexHash", default, skip_serializing_if = "Option::is_none")]
    hex_hash: Option<String>,
    #[serde(alias = "BundleRefIndex")]
    bundle_ref_index: i32,
    #[serde(alias = "AssetIndex", default, skip_serializing_if = "Option::is_none")]
    asset_index: Option<i32>,
    #[serde(alias = "AssetPath", default, skip_serializing_if = "Option::is_none")]
    asset_path: Option<String>,
}

impl TryFrom<RawAssetLookup> for AssetLookup {
    type Error = Error;

    fn try_from(value: RawAssetLookup) -> Result<Self, Self::Error> {
        let decimal = parse_hash(&value.hash)?;
        let hash = match value.hex_hash.as_deref() {
            Some(hex) => {
                let raw = parse_hex_hash(hex)?;
                if raw != decimal {
                    warn!("hash {} disagrees with hex hash {}, using the hex bytes", decimal, hex);
                }
                raw
            }
            None => decimal,
        };

        let asset = match (value.asset_index, value.asset_path) {
            (Some(index), _) => AssetRef::ByIndex(index),
            (None, Some(path)) => AssetRef::ByPath(path),
            (None, None) => {
                return Err(Error::CustomError(format!(
                    "asset lookup {} has neither an asset index nor an asset path",
                    value.hash
                )))
            }
        };

        Ok(AssetLookup {
            hash,
            bundle_ref_index: value.bundle_ref_index,
            asset,
        })
    }
}

impl From<AssetLookup> for RawAssetLookup {
    fn from(value: AssetLookup) -> Self {
        let (asset_index, asset_path) = match value.asset {
            AssetRef::ByIndex(index) => (Some(index), None),
            AssetRef::ByPath(path) => (None, Some(path)),
        };
        RawAssetLookup {
            hash: value.hash.to_string(),
            hex_hash: Some(hex_hash(value.hash)),
            bundle_ref_index: value.bundle_ref_index,
            asset_index,
            asset_path,
        }
    }
}

/// A decoded bundle reference table
///
/// ```
/// use brt_table::document::{Asset, AssetLookup, AssetRef, BrtDocument, BrtFormat, BundleRef};
///
/// let document = BrtDocument::builder()
///     .table_name("bundles")
///     .format(BrtFormat::NoGuid)
///     .bundle_refs(vec![BundleRef::indexed("win32/ui", "data/win32", 0)])
///     .assets(vec![Asset::new("foo.tex", "art")])
///     .asset_lookups(vec![AssetLookup::new(1, 0, AssetRef::ByIndex(0))])
///     .build();
///
/// assert_eq!(document.asset_lookup_count(), 1);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument", into = "RawDocument")]
pub struct BrtDocument {
    #[builder(into)]
    pub table_name: String,
    pub format: BrtFormat,
    /// Present for `Guid` and `CompressedStrings`
    pub instance_guid: Option<Guid>,
    /// Opaque header value kept verbatim
    #[builder(default)]
    pub unknown_hash: u32,
    #[builder(default)]
    pub bundles: Vec<Bundle>,
    #[builder(default)]
    pub bundle_refs: Vec<BundleRef>,
    #[builder(default)]
    pub assets: Vec<Asset>,
    #[builder(default)]
    pub asset_lookups: Vec<AssetLookup>,
}

impl BrtDocument {
    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    pub fn bundle_ref_count(&self) -> usize {
        self.bundle_refs.len()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn asset_lookup_count(&self) -> usize {
        self.asset_lookups.len()
    }

    /// Index of the first lookup keyed by `hash`
    pub fn find_lookup(&self, hash: u64) -> Option<usize> {
        self.asset_lookups.iter().position(|l| l.hash == hash)
    }

    /// Parse a document from its JSON form
    pub fn from_json(reader: impl std::io::Read) -> crate::error::Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the document as pretty printed JSON
    pub fn to_json(&self, writer: impl std::io::Write) -> crate::error::Result<()> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }
}

#[derive(Serialize, Deserialize)]
struct RawDocument {
    #[serde(alias = "brtName")]
    table_name: String,
    #[serde(alias = "brtFormat")]
    format: BrtFormat,
    #[serde(alias = "brtInstanceGuid", default, skip_serializing_if = "Option::is_none")]
    instance_guid: Option<Guid>,
    #[serde(alias = "unkHash", default)]
    unknown_hash: u32,
    #[serde(alias = "assetLookupCount", default)]
    asset_lookup_count: Option<usize>,
    #[serde(alias = "bundleRefCount", default)]
    bundle_ref_count: Option<usize>,
    #[serde(alias = "assetCount", default)]
    asset_count: Option<usize>,
    #[serde(default)]
    bundles: Vec<Bundle>,
    #[serde(alias = "bundleRefs", default)]
    bundle_refs: Vec<BundleRef>,
    #[serde(default)]
    assets: Vec<Asset>,
    #[serde(alias = "assetLookups", default)]
    asset_lookups: Vec<AssetLookup>,
}

impl TryFrom<RawDocument> for BrtDocument {
    type Error = Error;

    fn try_from(value: RawDocument) -> Result<Self, Self::Error> {
        let checks = [
            ("asset lookup", value.asset_lookup_count, value.asset_lookups.len()),
            ("bundle ref", value.bundle_ref_count, value.bundle_refs.len()),
            ("asset", value.asset_count, value.assets.len()),
        ];
        for (name, stored, actual) in checks {
            if let Some(stored) = stored.filter(|stored| *stored != actual) {
                warn!("{} count is {} but {} entries are present, using the entries", name, stored, actual);
            }
        }

        Ok(BrtDocument {
            table_name: value.table_name,
            format: value.format,
            instance_guid: value.instance_guid,
            unknown_hash: value.unknown_hash,
            bundles: value.bundles,
            bundle_refs: value.bundle_refs,
            assets: value.assets,
            asset_lookups: value.asset_lookups,
        })
    }
}

impl From<BrtDocument> for RawDocument {
    fn from(value: BrtDocument) -> Self {
        RawDocument {
            asset_lookup_count: Some(value.asset_lookup_count()),
            bundle_ref_count: Some(value.bundle_ref_count()),
            asset_count: Some(value.asset_count()),
            table_name: value.table_name,
            format: value.format,
            instance_guid: value.instance_guid,
            unknown_hash: value.unknown_hash,
            bundles: value.bundles,
            bundle_refs: value.bundle_refs,
            assets: value.assets,
            asset_lookups: value.asset_lookups,
        }
    }
}
