use std::fs::File;
use std::path::{Path, PathBuf};

use brt_table::document::{Asset, AssetLookup, AssetRef, BrtDocument, BrtFormat, Bundle, BundleRef};
use brt_table::error::{Error, Result};
use brt_table::{decode, encode};
use pretty_assertions::assert_eq;
use tracing::{info, instrument};
use tracing_test::traced_test;

fn resources() -> Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(format!("{}/resources/", env!("CARGO_MANIFEST_DIR")))?
        .filter_map(|res| res.ok())
        .map(|dir_entry| dir_entry.path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "json"))
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

fn sorted(mut document: BrtDocument) -> BrtDocument {
    document.asset_lookups.sort_by_key(|lookup| lookup.hash);
    document
}

#[instrument(skip_all, fields(file = %path.file_name().unwrap().to_string_lossy()))]
fn validate_round_trip(path: &Path) -> Result<()> {
    let document = BrtDocument::from_json(File::open(path)?)?;
    info!("encoding {} as {}", document.table_name, document.format);

    let data = encode(&document)?;
    let decoded = decode(&data, document.format)?;
    assert_eq!(decoded, sorted(document));

    let again = encode(&decoded)?;
    assert_eq!(again.len(), data.len());
    assert_eq!(again, data);

    Ok(())
}

#[traced_test]
#[test]
fn round_trip_resources() -> Result<()> {
    let paths = resources()?;
    if paths.len() != 3 {
        return Err(Error::CustomError(format!("expected 3 documents, found {}", paths.len())));
    }

    for path in paths {
        validate_round_trip(&path)?;
    }

    Ok(())
}

#[test]
fn exact_no_guid_resource() -> Result<()> {
    let document = BrtDocument::builder()
        .table_name("ui")
        .format(BrtFormat::NoGuid)
        .unknown_hash(0x11223344)
        .bundles(vec![Bundle {
            name: "ui".into(),
            parent_index: 0,
        }])
        .bundle_refs(vec![BundleRef::indexed("ui", "win32", 0)])
        .assets(vec![Asset::new("foo.tex", "art")])
        .asset_lookups(vec![AssetLookup::new(0x0807060504030201, 0, AssetRef::ByIndex(0))])
        .build();

    let data = encode(&document)?;

    assert_eq!(data.len(), 252);
    #[rustfmt::skip]
    let header = [
        0xB8, 0x00, 0x00, 0x00,
        0x34, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    assert_eq!(&data[..0x10], &header);

    let relocations = data[0xC8..]
        .chunks(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect::<Vec<_>>();
    assert_eq!(
        relocations,
        vec![0x00, 0x08, 0x10, 0x18, 0x20, 0x28, 0x70, 0x78, 0x80, 0x88, 0x90, 0xA8, 0xB0]
    );

    assert_eq!(decode(&data, BrtFormat::NoGuid)?, document);

    Ok(())
}

#[test]
fn lookups_sort_stably() -> Result<()> {
    let document = BrtDocument::builder()
        .table_name("ui")
        .format(BrtFormat::NoGuid)
        .bundles(vec![Bundle {
            name: "ui".into(),
            parent_index: 0,
        }])
        .bundle_refs(vec![
            BundleRef::indexed("a", "win32", 0),
            BundleRef::indexed("b", "win32", 0),
            BundleRef::indexed("c", "win32", 0),
        ])
        .assets(vec![Asset::new("foo.tex", "art")])
        .asset_lookups(vec![
            AssetLookup::new(u64::MAX, 0, AssetRef::ByIndex(0)),
            AssetLookup::new(7, 2, AssetRef::ByIndex(0)),
            AssetLookup::new(7, 0, AssetRef::ByIndex(0)),
            AssetLookup::new(7, 1, AssetRef::ByIndex(0)),
            AssetLookup::new(1, 0, AssetRef::ByIndex(0)),
        ])
        .build();

    let decoded = decode(&encode(&document)?, BrtFormat::NoGuid)?;

    let order = decoded
        .asset_lookups
        .iter()
        .map(|lookup| (lookup.hash, lookup.bundle_ref_index))
        .collect::<Vec<_>>();
    assert_eq!(order, vec![(1, 0), (7, 2), (7, 0), (7, 1), (u64::MAX, 0)]);

    Ok(())
}

#[test]
fn long_compressed_path() -> Result<()> {
    let path = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect::<String>();
    let document = BrtDocument::builder()
        .table_name("kits")
        .format(BrtFormat::CompressedStrings)
        .instance_guid("00112233-4455-6677-8899-aabbccddeeff".parse()?)
        .bundle_refs(vec![BundleRef::path(path.clone(), -1)])
        .asset_lookups(vec![AssetLookup::new(1, 0, AssetRef::ByPath(path.clone()))])
        .build();

    let data = encode(&document)?;
    let decoded = decode(&data, BrtFormat::CompressedStrings)?;

    assert_eq!(decoded.bundle_refs[0], BundleRef::path(path.clone(), -1));
    assert_eq!(decoded.asset_lookups[0].asset, AssetRef::ByPath(path));

    Ok(())
}

#[test]
fn bundle_count_inferred_from_references() -> Result<()> {
    let bundle = |name: &str| Bundle {
        name: name.into(),
        parent_index: 0,
    };
    let document = BrtDocument::builder()
        .table_name("ui")
        .format(BrtFormat::Guid)
        .instance_guid(brt_table::Guid::default())
        .bundles(vec![bundle("root"), bundle("left"), bundle("right")])
        .bundle_refs(vec![
            BundleRef::indexed("root", "win32", 0),
            BundleRef::indexed("right", "win32", 2),
            BundleRef::indexed("left", "win32", 1),
        ])
        .build();

    let decoded = decode(&encode(&document)?, BrtFormat::Guid)?;

    assert_eq!(decoded.bundle_count(), 3);
    assert_eq!(decoded.bundle_ref_count(), 3);

    Ok(())
}

#[test]
fn encode_rejects_dangling_index() {
    let document = BrtDocument::builder()
        .table_name("ui")
        .format(BrtFormat::NoGuid)
        .asset_lookups(vec![AssetLookup::new(1, 0, AssetRef::ByIndex(0))])
        .build();

    assert!(matches!(encode(&document), Err(Error::UnresolvedReference(_))));
}

/// CompressedStrings table whose string table shares prefixes through base references:
/// `data/` <- `win64/` <- `kits` <- `/home.tex`
fn delta_chain_resource() -> Vec<u8> {
    #[rustfmt::skip]
    let outer = [
        0xC0, 0x00, 0x00, 0x00,
        0x14, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    #[rustfmt::skip]
    let header = [
        0x50, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0xA0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x90, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x60, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x55, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
        0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
        0x01, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00,
        0x04, 0x00, 0x00, 0x00,
        0x2A, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
    ];
    #[rustfmt::skip]
    let bundle_ref = [
        0x13, 0x00, 0x80, 0x04, 0xFF, 0xFF, 0xFF, 0xFF,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    #[rustfmt::skip]
    let lookup = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        0x00, 0x00, 0x00, 0x00,
        0x1B, 0x00, 0x80, 0x09,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    let mut data = Vec::new();
    data.extend_from_slice(&outer);
    data.extend_from_slice(&header);
    data.extend_from_slice(b"kits\0\0");
    data.resize(0x10 + 0x60, 0);

    data.extend_from_slice(b"\xFF\xFF\xFF\xFFdata/");
    data.extend_from_slice(b"\x00\x00\x00\x05win64/");
    data.extend_from_slice(b"\x09\x00\x00\x06kits");
    data.extend_from_slice(b"\x13\x00\x00\x04/home.tex");
    data.resize(0x10 + 0x90, 0);

    data.extend_from_slice(&bundle_ref);
    data.extend_from_slice(&lookup);
    for pointer in [0x00u32, 0x08, 0x10, 0x18, 0x20] {
        data.extend_from_slice(&pointer.to_le_bytes());
    }
    data
}

fn string_count(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[0x50], data[0x51], data[0x52], data[0x53]])
}

#[traced_test]
#[test]
fn compressed_delta_chains_resolve() -> Result<()> {
    let data = delta_chain_resource();
    assert_eq!(data.len(), 228);

    let decoded = decode(&data, BrtFormat::CompressedStrings)?;
    assert_eq!(decoded.table_name, "kits");
    assert_eq!(decoded.unknown_hash, 0x2A);
    assert_eq!(decoded.bundle_refs, vec![BundleRef::path("data/win64/kits", -1)]);
    assert_eq!(
        decoded.asset_lookups,
        vec![AssetLookup::new(
            0x0807060504030201,
            0,
            AssetRef::ByPath("data/win64/kits/home.tex".into())
        )]
    );
    assert!(!logs_contain("unexpected table layout"));

    // Re-encoding writes standalone entries, so the chain is not reproduced byte for byte
    let again = encode(&decoded)?;
    assert_eq!(string_count(&data), 4);
    assert_eq!(string_count(&again), 2);
    assert_eq!(decode(&again, BrtFormat::CompressedStrings)?, decoded);

    Ok(())
}

#[traced_test]
#[test]
fn compressed_misplaced_empty_string_is_logged() -> Result<()> {
    let mut data = delta_chain_resource();
    // Point the empty string at the table name
    data[0x10 + 0x20] = 0x50;

    let decoded = decode(&data, BrtFormat::CompressedStrings)?;
    assert_eq!(decoded.bundle_refs, vec![BundleRef::path("data/win64/kits", -1)]);
    assert!(logs_contain("expected an empty string at 0x50"));

    Ok(())
}
