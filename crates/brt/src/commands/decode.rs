use std::path::PathBuf;

use brt_table::BrtDocument;
use clap::Args;
use miette::{Context, Result};
use tracing::info;

use super::{create, open, output_path, FormatArgs};

#[derive(Args)]
pub struct DecodeArgs {
    /// An input BRT resource
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target JSON document, defaults to the input with a .json extension
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    format: FormatArgs,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl DecodeArgs {
    pub fn handle(&self) -> Result<()> {
        let format = self.format.format()?;
        let output = output_path(self.output.as_ref(), &self.file, "json");

        info!("decoding {} as {}", self.file.display(), format);
        let document = BrtDocument::read(open(&self.file)?, format)
            .context(format!("decoding {}", self.file.display()))?;

        info!(
            "{}: {} bundles, {} bundle refs, {} assets, {} asset lookups",
            document.table_name,
            document.bundle_count(),
            document.bundle_ref_count(),
            document.asset_count(),
            document.asset_lookup_count()
        );

        let out = create(&output, self.overwrite)?;
        document
            .to_json(std::io::BufWriter::new(out))
            .context(format!("writing {}", output.display()))?;

        info!("wrote {}", output.display());
        Ok(())
    }
}
