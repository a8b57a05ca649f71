use brt_table::Game;
use clap::Args;
use itertools::Itertools;
use miette::Result;
use owo_colors::{OwoColorize, Stream::Stdout};

#[derive(Args)]
pub struct GamesArgs {}

impl GamesArgs {
    pub fn handle(&self) -> Result<()> {
        let width = Game::ALL.iter().map(|game| game.slug().len()).max().unwrap_or_default();

        let lines = Game::ALL
            .iter()
            .sorted_by_key(|game| game.to_string())
            .map(|game| {
                let slug = format!("{:width$}", game.slug());
                let title = format!("{:<26}", game.to_string());
                format!(
                    "{}  {}  {}",
                    slug.if_supports_color(Stdout, |text| text.bold()),
                    title,
                    game.format().if_supports_color(Stdout, |text| text.cyan()),
                )
            })
            .join("\n");

        println!("{lines}");
        Ok(())
    }
}
