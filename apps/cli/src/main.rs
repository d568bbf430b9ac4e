//! Prospector CLI for discovering and tracking outreach prospects.
//!
//! Pulls candidate companies from a source, scores them with an LLM
//! judgment oracle, drafts outreach for the promising ones, and keeps the
//! results in a local or remote libSQL database.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
