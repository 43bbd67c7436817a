use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use pagesim::cli::commands::{handle_chunk, handle_config, handle_model, handle_search};
use pagesim::cli::output::get_formatter;
use pagesim::cli::{Cli, Commands};
use pagesim::models::{Config, OutputFormat};

/// Detect ONNX Runtime library path and set ORT_DYLIB_PATH if not already set.
/// Must be called before any ort code runs.
fn detect_and_set_ort_path() {
    if std::env::var("ORT_DYLIB_PATH")
        .map(|p| Path::new(&p).exists())
        .unwrap_or(false)
    {
        return;
    }

    let home = std::env::var("HOME").unwrap_or_default();

    let found = if cfg!(target_os = "macos") {
        [
            format!("{home}/.local/lib/pagesim/libonnxruntime.dylib"),
            "/opt/homebrew/opt/onnxruntime/lib/libonnxruntime.dylib".into(),
            "/usr/local/opt/onnxruntime/lib/libonnxruntime.dylib".into(),
        ]
        .into_iter()
        .find(|p| Path::new(p).exists())
    } else if cfg!(target_os = "linux") {
        [
            format!("{home}/.local/lib/pagesim/libonnxruntime.so"),
            "/usr/lib/libonnxruntime.so".into(),
            "/usr/local/lib/libonnxruntime.so".into(),
            "/usr/lib/x86_64-linux-gnu/libonnxruntime.so".into(),
            "/usr/lib/aarch64-linux-gnu/libonnxruntime.so".into(),
        ]
        .into_iter()
        .find(|p| Path::new(p).exists())
    } else {
        None
    };

    if let Some(path) = found {
        // SAFETY: Called at program start before any threads are spawned.
        unsafe {
            std::env::set_var("ORT_DYLIB_PATH", path);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,pagesim=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    detect_and_set_ort_path();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default();
    let format = cli.format.unwrap_or(config.search.default_format);

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        tokio::select! {
            result = run_command(cli.command, format, cli.verbose) => result,
            _ = shutdown_signal() => {
                eprintln!("\nReceived shutdown signal, cleaning up...");
                Ok(())
            }
        }
    });

    if let Err(e) = result {
        eprint!("{}", get_formatter(format).format_error(&format!("{e:#}")));
        std::process::exit(1);
    }

    Ok(())
}

async fn run_command(command: Commands, format: OutputFormat, verbose: bool) -> Result<()> {
    match command {
        Commands::Search(args) => {
            handle_search(args, format, verbose).await?;
        }
        Commands::Chunk(args) => {
            handle_chunk(args, format, verbose).await?;
        }
        Commands::Model(cmd) => {
            handle_model(cmd, format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
