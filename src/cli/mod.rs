//! Command-line interface for pagesim.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Split a page into overlapping chunks and rank them against a query.
#[derive(Debug, Parser)]
#[command(name = "pagesim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank the chunks of a source by similarity to a query
    Search(commands::SearchArgs),

    /// Show how a source is split, without embedding it
    Chunk(commands::ChunkArgs),

    /// Manage local embedding models
    #[command(subcommand)]
    Model(commands::ModelCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "pagesim",
            "search",
            "what are the risks",
            "--url",
            "https://example.com",
            "-n",
            "3",
            "--interval",
            "20",
            "--overlap",
            "3",
            "-f",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "what are the risks");
                assert_eq!(args.input.url.as_deref(), Some("https://example.com"));
                assert_eq!(args.limit, Some(3));
                assert_eq!(args.splitter.interval, Some(20));
                assert_eq!(args.splitter.overlap, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_inputs_are_exclusive() {
        let result = Cli::try_parse_from([
            "pagesim",
            "chunk",
            "--text",
            "hello",
            "--url",
            "https://example.com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_model_download() {
        let cli =
            Cli::try_parse_from(["pagesim", "model", "download", "org/name", "--force"]).unwrap();
        match cli.command {
            Commands::Model(commands::ModelCommand::Download {
                model_id, force, ..
            }) => {
                assert_eq!(model_id.as_deref(), Some("org/name"));
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
