use std::io::{BufReader, Write};
use std::path::PathBuf;

use brt_table::{BrtDocument, BrtFormat};
use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use tracing::{info, warn};

use super::{create, open, output_path};

#[derive(Args)]
pub struct EncodeArgs {
    /// An input JSON document
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target BRT resource, defaults to the input with a .res extension
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Format to use when the document does not name one
    #[arg(long, value_name = "FORMAT")]
    format: Option<BrtFormat>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl EncodeArgs {
    fn load(&self) -> Result<BrtDocument> {
        let mut value: serde_json::Value = serde_json::from_reader(BufReader::new(open(&self.file)?))
            .into_diagnostic()
            .context(format!("parsing {}", self.file.display()))?;

        let named = ["format", "brtFormat"]
            .iter()
            .any(|key| value.get(key).is_some());
        match (named, self.format, value.as_object_mut()) {
            (false, Some(format), Some(object)) => {
                info!("document has no format, using {}", format);
                object.insert("format".into(), u32::from(format).into());
            }
            (true, Some(format), _) => warn!("document names its own format, ignoring {}", format),
            _ => {}
        }

        serde_json::from_value(value)
            .into_diagnostic()
            .context(format!("reading document {}", self.file.display()))
    }

    pub fn handle(&self) -> Result<()> {
        let document = self.load()?;
        let output = output_path(self.output.as_ref(), &self.file, "res");

        info!(
            "encoding {} as {} with {} asset lookups",
            document.table_name,
            document.format,
            document.asset_lookup_count()
        );

        let data = brt_table::encode(&document).context(format!("encoding {}", self.file.display()))?;

        let mut out = create(&output, self.overwrite)?;
        out.write_all(&data)
            .into_diagnostic()
            .context(format!("writing {}", output.display()))?;

        info!("wrote {} bytes to {}", data.len(), output.display());
        Ok(())
    }
}
