use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration and model store paths")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => handle_init(force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(),
    }
}

fn handle_init(force: bool, formatter: &dyn Formatter) -> Result<()> {
    let config_path =
        Config::config_path().ok_or_else(|| anyhow!("could not determine config directory"))?;

    if config_path.exists() && !force {
        bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = Config::default()
        .save()
        .context("failed to create config")?;
    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );

    Ok(())
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(path) = Config::config_path().filter(|p| p.exists()) {
        println!("# Config: {}", path.display());
    } else {
        println!("# Config: defaults (no config file)");
    }
    println!();
    print!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

fn handle_path() -> Result<()> {
    let describe = |exists: bool| if exists { "active" } else { "would be" };

    if let Some(path) = Config::config_path() {
        println!("Config file ({}): {}", describe(path.exists()), path.display());
    }
    if let Some(dir) = Config::models_dir() {
        println!("Model store ({}): {}", describe(dir.exists()), dir.display());
    }
    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        println!(".env file ({}): {}", describe(env_path.exists()), env_path.display());
    }

    Ok(())
}
