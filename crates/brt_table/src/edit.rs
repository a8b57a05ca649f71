//! Structural edits on a decoded [`BrtDocument`].
//!
//! Edits only touch list indices; pointers are recomputed when the document is encoded again.

use std::collections::{HashMap, HashSet};

use derive_more::derive::Constructor;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::document::{Asset, AssetLookup, AssetRef, BrtDocument, Bundle, BundleRef};
use crate::error::{MergeConflict, Result, UnresolvedReference};
use crate::hash::{hash64, CaseMode};

/// An asset path and the path of the copy that should resolve to the same bundle ref
#[derive(Constructor, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    #[serde(alias = "Original")]
    pub original: String,
    #[serde(alias = "Dupe")]
    pub duplicate: String,
}

/// Outcome of [`import_duplicates`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Pairs that added lookups
    pub imported: usize,
    /// Pairs whose duplicate path already had a lookup
    pub already_present: usize,
    /// Pairs whose original path has no lookup
    pub unresolved: Vec<UnresolvedReference>,
}

/// Outcome of [`merge`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added_lookups: usize,
    pub added_bundle_refs: usize,
    pub added_assets: usize,
    pub added_bundles: usize,
    /// Lookups of the secondary document whose hash was already present
    pub skipped: usize,
    /// Lookups of the secondary document that reference records it does not contain
    pub unresolved: Vec<UnresolvedReference>,
}

/// Split a path at its last `/` into directory and file name
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((directory, file_name)) => (directory, file_name),
        None => ("", path),
    }
}

/// Make every duplicate path resolve to the bundle ref of its original.
///
/// The original lookup is found by the hash of its lower-cased path, falling back to the hash of
/// its lower-cased file name. Each imported pair appends two lookups, keyed by the duplicate's
/// full path and by its file name. Indexed formats also get a new [`Asset`] both lookups point
/// at; `CompressedStrings` lookups name the lower-cased path or file name they were hashed from.
///
/// Pairs whose original cannot be found are skipped and reported.
#[instrument(skip_all, fields(table_name = %document.table_name, pairs = pairs.len()))]
pub fn import_duplicates(document: &mut BrtDocument, pairs: &[DuplicatePair]) -> ImportReport {
    let mut report = ImportReport::default();

    for pair in pairs {
        let original = pair.original.to_lowercase();
        let duplicate = pair.duplicate.to_lowercase();
        let (directory, file_name) = split_path(&duplicate);

        let path_hash = hash64(&duplicate, CaseMode::Lower);
        let name_hash = hash64(file_name, CaseMode::Lower);

        if document.find_lookup(path_hash).is_some() {
            debug!("{} already has a lookup", duplicate);
            report.already_present += 1;
            continue;
        }

        let original_hash = hash64(&original, CaseMode::Lower);
        let found = document.find_lookup(original_hash).or_else(|| {
            let (_, original_name) = split_path(&original);
            document.find_lookup(hash64(original_name, CaseMode::Lower))
        });

        let Some(found) = found else {
            warn!("no asset lookup for {}, skipping {}", pair.original, pair.duplicate);
            report.unresolved.push(UnresolvedReference::Hash {
                path: pair.original.clone(),
                hash: original_hash,
            });
            continue;
        };

        let bundle_ref_index = document.asset_lookups[found].bundle_ref_index;
        // Compressed lookups name the path they were hashed from
        let (path_asset, name_asset) = if document.format.is_indexed() {
            document.assets.push(Asset::new(file_name, directory));
            let index = AssetRef::ByIndex(document.assets.len() as i32 - 1);
            (index.clone(), index)
        } else {
            (
                AssetRef::ByPath(duplicate.clone()),
                AssetRef::ByPath(file_name.to_owned()),
            )
        };

        document
            .asset_lookups
            .push(AssetLookup::new(path_hash, bundle_ref_index, path_asset));
        document
            .asset_lookups
            .push(AssetLookup::new(name_hash, bundle_ref_index, name_asset));

        debug!("{} now resolves through bundle ref {}", duplicate, bundle_ref_index);
        report.imported += 1;
    }

    info!(
        imported = report.imported,
        already_present = report.already_present,
        unresolved = report.unresolved.len(),
        "duplicate import finished"
    );

    report
}

struct Merger<'a> {
    target: &'a mut BrtDocument,
    source: &'a BrtDocument,
    bundle_refs: HashMap<usize, i32>,
    assets: HashMap<usize, i32>,
    bundles: HashMap<usize, i32>,
    report: MergeReport,
}

impl Merger<'_> {
    fn source_index(index: i32, len: usize) -> Option<usize> {
        usize::try_from(index).ok().filter(|index| *index < len)
    }

    /// Index in the target of the source bundle at `index`, appending it when missing
    fn bundle(&mut self, index: usize) -> i32 {
        if let Some(translated) = self.bundles.get(&index) {
            return *translated;
        }

        let source = self.source;
        let bundle = &source.bundles[index];
        if let Some(existing) = self.target.bundles.iter().position(|b| b.name == bundle.name) {
            self.bundles.insert(index, existing as i32);
            return existing as i32;
        }

        let appended = self.target.bundles.len();
        self.target.bundles.push(Bundle {
            name: bundle.name.clone(),
            parent_index: bundle.parent_index,
        });
        self.bundles.insert(index, appended as i32);
        self.report.added_bundles += 1;

        // Parents outside the source list are carried over as they are
        if let Some(parent) = Self::source_index(bundle.parent_index, source.bundles.len()) {
            let parent_index = self.bundle(parent);
            self.target.bundles[appended].parent_index = parent_index;
        }

        appended as i32
    }

    fn bundle_ref(&mut self, index: usize) -> std::result::Result<i32, UnresolvedReference> {
        if let Some(translated) = self.bundle_refs.get(&index) {
            return Ok(*translated);
        }

        let source = self.source;
        let translated = match &source.bundle_refs[index] {
            BundleRef::Indexed {
                name,
                directory,
                bundle_index,
            } => {
                let existing = self.target.bundle_refs.iter().position(|candidate| {
                    matches!(candidate, BundleRef::Indexed { name: n, directory: d, .. } if n == name && d == directory)
                });
                match existing {
                    Some(existing) => existing as i32,
                    None => {
                        let bundle = Self::source_index(*bundle_index, source.bundles.len())
                            .ok_or(UnresolvedReference::Bundle(*bundle_index))?;
                        let bundle_index = self.bundle(bundle);
                        self.target
                            .bundle_refs
                            .push(BundleRef::indexed(name.clone(), directory.clone(), bundle_index));
                        self.report.added_bundle_refs += 1;
                        self.target.bundle_refs.len() as i32 - 1
                    }
                }
            }
            BundleRef::Path { path, parent_index } => {
                let folded = path.to_lowercase();
                let existing = self.target.bundle_refs.iter().position(|candidate| {
                    matches!(candidate, BundleRef::Path { path: p, .. } if p.to_lowercase() == folded)
                });
                match existing {
                    Some(existing) => existing as i32,
                    None => {
                        self.target
                            .bundle_refs
                            .push(BundleRef::path(path.clone(), *parent_index));
                        self.report.added_bundle_refs += 1;
                        self.target.bundle_refs.len() as i32 - 1
                    }
                }
            }
        };

        self.bundle_refs.insert(index, translated);
        Ok(translated)
    }

    fn asset(&mut self, index: usize) -> i32 {
        if let Some(translated) = self.assets.get(&index) {
            return *translated;
        }

        let source = self.source;
        let asset = &source.assets[index];
        let translated = match self.target.assets.iter().position(|candidate| candidate == asset) {
            Some(existing) => existing as i32,
            None => {
                self.target.assets.push(asset.clone());
                self.report.added_assets += 1;
                self.target.assets.len() as i32 - 1
            }
        };

        self.assets.insert(index, translated);
        translated
    }

    fn lookup(&mut self, lookup: &AssetLookup) -> std::result::Result<AssetLookup, UnresolvedReference> {
        // Resolve the asset first so a dangling asset leaves the target untouched
        let asset = match &lookup.asset {
            AssetRef::ByIndex(index) => {
                let source = Self::source_index(*index, self.source.assets.len())
                    .ok_or(UnresolvedReference::Asset(*index))?;
                Some(source)
            }
            AssetRef::ByPath(_) => None,
        };

        let bundle_ref = Self::source_index(lookup.bundle_ref_index, self.source.bundle_refs.len())
            .ok_or(UnresolvedReference::BundleRef(lookup.bundle_ref_index))?;
        let bundle_ref_index = self.bundle_ref(bundle_ref)?;

        let asset = match (asset, &lookup.asset) {
            (Some(source), _) => AssetRef::ByIndex(self.asset(source)),
            (None, asset) => asset.clone(),
        };

        Ok(AssetLookup::new(lookup.hash, bundle_ref_index, asset))
    }
}

/// Merge the lookups of `source` into `target`.
///
/// `target` has priority: a hash it already contains is never replaced. Lookups of `source`
/// with a new hash are appended along with whatever bundle refs, assets and bundles they need
/// that `target` does not already have. Existing records of `target` keep their order.
///
/// Both documents must share their table name and format, otherwise nothing is changed.
#[instrument(skip_all, fields(table_name = %target.table_name), err)]
pub fn merge(target: &mut BrtDocument, source: &BrtDocument) -> Result<MergeReport> {
    if target.table_name != source.table_name {
        return Err(MergeConflict::TableName(target.table_name.clone(), source.table_name.clone()).into());
    }
    if target.format != source.format {
        return Err(MergeConflict::Format(target.format.into(), source.format.into()).into());
    }

    let mut present: HashSet<u64> = target.asset_lookups.iter().map(|l| l.hash).collect();

    let mut merger = Merger {
        target,
        source,
        bundle_refs: HashMap::new(),
        assets: HashMap::new(),
        bundles: HashMap::new(),
        report: MergeReport::default(),
    };

    for lookup in &source.asset_lookups {
        if present.contains(&lookup.hash) {
            merger.report.skipped += 1;
            continue;
        }

        match merger.lookup(lookup) {
            Ok(translated) => {
                present.insert(translated.hash);
                merger.target.asset_lookups.push(translated);
                merger.report.added_lookups += 1;
            }
            Err(reference) => {
                warn!("skipping lookup {:#018x}: {}", lookup.hash, reference);
                merger.report.unresolved.push(reference);
            }
        }
    }

    let report = merger.report;
    info!(
        added_lookups = report.added_lookups,
        added_bundle_refs = report.added_bundle_refs,
        added_assets = report.added_assets,
        added_bundles = report.added_bundles,
        skipped = report.skipped,
        "merge finished"
    );

    Ok(report)
}
