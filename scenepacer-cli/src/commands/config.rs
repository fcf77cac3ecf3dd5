//! Configuration management CLI commands.
//!
//! Provides `config path`, `config list`, and `config init`.

use std::path::Path;

use clap::Subcommand;
use scenepacer::config::{config_file_path, ConfigError, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List the effective configuration settings
    List,

    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::List => run_list(),
        ConfigCommands::Init { force } => {
            let path = config_file_path().ok_or(ConfigError::NoHomeDirectory)?;
            run_init(&path, force)
        }
    }
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    let path = config_file_path().ok_or(ConfigError::NoHomeDirectory)?;
    println!("{}", path.display());
    Ok(())
}

/// List all configuration settings.
fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();

    println!("Configuration Settings");
    println!("======================");
    println!();
    print!("{}", format_entries(&config));

    Ok(())
}

fn format_entries(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut current_section = String::new();

    for (section, key, value) in config.entries() {
        if section != current_section {
            if !current_section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            current_section = section;
        }

        if value.is_empty() {
            out.push_str(&format!("  {} = (not set)\n", key));
        } else {
            out.push_str(&format!("  {} = {}\n", key, value));
        }
    }

    out
}

/// Write the default configuration to `path`.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }

    ConfigFile::default().save_to(path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize scenepacer settings.");
    Ok(())
}
