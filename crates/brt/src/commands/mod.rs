use std::fs::File;
use std::path::{Path, PathBuf};

use brt_table::{BrtFormat, Game};
use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};

pub mod decode;
pub mod encode;
pub mod games;
pub mod import;
pub mod merge;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Convert a BRT resource into a JSON document
    Decode(decode::DecodeArgs),
    /// Convert a JSON document into a BRT resource
    Encode(encode::EncodeArgs),
    /// Add duplicate asset paths from a sheet to a JSON document
    Import(import::ImportArgs),
    /// Merge the lookups of one JSON document into another
    Merge(merge::MergeArgs),
    /// List the known games and the format they use
    Games(games::GamesArgs),
}

impl Commands {
    pub fn handle(&self) -> Result<()> {
        match self {
            Commands::Decode(decode) => decode.handle(),
            Commands::Encode(encode) => encode.handle(),
            Commands::Import(import) => import.handle(),
            Commands::Merge(merge) => merge.handle(),
            Commands::Games(games) => games.handle(),
        }
    }
}

/// Format of a table, given directly or through the game that shipped it
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct FormatArgs {
    /// Table format: no-guid, guid or compressed-strings
    #[arg(long, value_name = "FORMAT")]
    format: Option<BrtFormat>,

    /// Game the table comes from, see the games command
    #[arg(long, value_name = "GAME")]
    game: Option<Game>,
}

impl FormatArgs {
    pub fn format(&self) -> Result<BrtFormat> {
        self.format
            .or(self.game.map(|game| game.format()))
            .ok_or(miette!("either a format or a game is required"))
    }
}

/// The given output path, or `input` with its extension replaced
pub(crate) fn output_path(output: Option<&PathBuf>, input: &Path, extension: &str) -> PathBuf {
    output
        .cloned()
        .unwrap_or_else(|| input.with_extension(extension))
}

pub(crate) fn create(path: &Path, overwrite: bool) -> Result<File> {
    if !overwrite {
        File::create_new(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    } else {
        File::create(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    }
}

pub(crate) fn open(path: &Path) -> Result<File> {
    File::open(path)
        .into_diagnostic()
        .context(format!("opening {}", path.display()))
}
