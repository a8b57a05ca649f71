use std::io::BufReader;
use std::path::{Path, PathBuf};

use brt_table::BrtDocument;
use clap::Args;
use miette::{Context, Result};
use tracing::info;

use super::{create, open};

#[derive(Args)]
pub struct MergeArgs {
    /// The JSON document whose entries win
    #[arg(short, long, value_name = "FILE")]
    primary: PathBuf,

    /// The JSON document to take missing entries from
    #[arg(short, long, value_name = "FILE")]
    secondary: PathBuf,

    /// A target JSON document
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

fn load(path: &Path) -> Result<BrtDocument> {
    BrtDocument::from_json(BufReader::new(open(path)?))
        .context(format!("reading document {}", path.display()))
}

impl MergeArgs {
    pub fn handle(&self) -> Result<()> {
        let mut primary = load(&self.primary)?;
        let secondary = load(&self.secondary)?;

        info!("merging {} into {}", self.secondary.display(), self.primary.display());
        let report = brt_table::merge(&mut primary, &secondary)?;

        info!(
            "added {} asset lookups, {} bundle refs, {} assets and {} bundles",
            report.added_lookups, report.added_bundle_refs, report.added_assets, report.added_bundles
        );
        if !report.unresolved.is_empty() {
            info!("{} lookups referenced missing records and were skipped", report.unresolved.len());
        }

        let out = create(&self.output, self.overwrite)?;
        primary
            .to_json(std::io::BufWriter::new(out))
            .context(format!("writing {}", self.output.display()))?;

        info!("wrote {}", self.output.display());
        Ok(())
    }
}
