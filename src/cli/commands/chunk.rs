use anyhow::{Context, Result};
use clap::Args;

use super::common::{InputArgs, SplitterArgs, load_source};
use crate::cli::output::{ChunkReport, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::TextSplitter;
use crate::utils::calculate_checksum;

#[derive(Debug, Args)]
pub struct ChunkArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub splitter: SplitterArgs,
}

pub async fn handle_chunk(args: ChunkArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let chunking = args.splitter.apply(&config.chunking);
    let splitter = TextSplitter::new(&chunking).context("invalid chunking options")?;

    let (source, text) = load_source(&args.input, &config).await?;
    if verbose {
        eprintln!("Source: {source} ({} chars)", text.chars().count());
    }

    let report = ChunkReport {
        checksum: calculate_checksum(&text),
        chunks: splitter.split(&text),
        interval: splitter.interval(),
        overlap: splitter.overlap(),
        source,
    };

    print!("{}", formatter.format_chunks(&report));

    Ok(())
}
