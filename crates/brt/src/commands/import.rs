use std::io::BufReader;
use std::path::PathBuf;

use brt_table::sheet::read_duplicate_pairs;
use brt_table::{import_duplicates, BrtDocument};
use clap::Args;
use miette::{Context, Result};
use tracing::{info, warn};

use super::{create, open};

#[derive(Args)]
pub struct ImportArgs {
    /// An input JSON document
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A CSV export of the duplication sheet with Original and Dupe columns, xlsx workbooks are not read
    #[arg(short, long, value_name = "FILE")]
    sheet: PathBuf,

    /// A target JSON document, defaults to overwriting the input
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ImportArgs {
    pub fn handle(&self) -> Result<()> {
        let mut document = BrtDocument::from_json(BufReader::new(open(&self.file)?))
            .context(format!("reading document {}", self.file.display()))?;

        let pairs = read_duplicate_pairs(&self.sheet)
            .context(format!("reading sheet {}", self.sheet.display()))?;
        info!("importing {} duplicate pairs", pairs.len());

        let report = import_duplicates(&mut document, &pairs);
        for reference in &report.unresolved {
            warn!("skipped: {}", reference);
        }
        info!(
            "imported {}, {} already present, {} skipped",
            report.imported,
            report.already_present,
            report.unresolved.len()
        );

        let output = self.output.as_ref().unwrap_or(&self.file);
        let out = create(output, true)?;
        document
            .to_json(std::io::BufWriter::new(out))
            .context(format!("writing {}", output.display()))?;

        info!("wrote {}", output.display());
        Ok(())
    }
}
