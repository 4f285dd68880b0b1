//! Config command - inspect and initialize pipeline configuration.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use danfex_core::PipelineConfig;

use super::process::load_config;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(default_value = "danfex.json")]
        path: PathBuf,
    },
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init { path } => {
            if path.exists() {
                anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
            }
            PipelineConfig::default().save(&path)?;
            println!(
                "{} Default configuration written to {}",
                style("✓").green(),
                path.display()
            );
        }
    }

    Ok(())
}
