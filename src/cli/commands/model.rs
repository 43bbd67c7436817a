use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;

use super::common::progress_bar;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, model_dir_name};
use crate::sources::ModelDownloader;

#[derive(Debug, Subcommand)]
pub enum ModelCommand {
    #[command(about = "Download every file of a HuggingFace model repository")]
    Download {
        #[arg(help = "Model id, e.g. Xenova/all-MiniLM-L6-v2 (defaults to the configured model)")]
        model_id: Option<String>,

        #[arg(long, short = 'o', help = "Target directory (defaults to the model store)")]
        output: Option<PathBuf>,

        #[arg(long, help = "Re-download files that already exist")]
        force: bool,
    },
    #[command(about = "Show where the configured model is loaded from")]
    Path,
}

pub async fn handle_model(cmd: ModelCommand, format: OutputFormat, verbose: bool) -> Result<()> {
    match cmd {
        ModelCommand::Download {
            model_id,
            output,
            force,
        } => handle_download(model_id, output, force, format, verbose).await,
        ModelCommand::Path => handle_path(),
    }
}

async fn handle_download(
    model_id: Option<String>,
    output: Option<PathBuf>,
    force: bool,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let model_id = model_id.unwrap_or_else(|| config.embedding.model_id.clone());

    let target = match output {
        Some(path) => path,
        None => Config::models_dir()
            .ok_or_else(|| anyhow!("could not determine data directory"))?
            .join(model_dir_name(&model_id)),
    };

    if verbose {
        eprintln!("Model: {model_id}");
        eprintln!("  Target: {}", target.display());
        eprintln!("  Force: {force}");
    }

    let downloader = ModelDownloader::from_env()?;

    let pb = progress_bar(0)?;
    let report = downloader
        .download_model(&model_id, &target, force, |file, total| {
            pb.set_length(total as u64);
            pb.set_message(file.to_string());
            pb.inc(1);
        })
        .await
        .with_context(|| format!("failed to download {model_id}"))?;
    pb.finish_and_clear();

    print!("{}", formatter.format_download(&report));

    if !report.is_complete() {
        bail!(
            "{} of {} files failed to download",
            report.failed.len(),
            report.failed.len() + report.downloaded.len() + report.skipped.len()
        );
    }

    Ok(())
}

fn handle_path() -> Result<()> {
    let config = Config::load()?;
    let dir = config.model_dir()?;
    let status = if dir.exists() { "present" } else { "missing" };
    println!("{} ({status})", dir.display());
    Ok(())
}
