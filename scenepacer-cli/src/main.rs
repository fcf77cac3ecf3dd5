//! ScenePacer CLI
//!
//! Command-line front-end to the scenepacer library: run the label declutter
//! on an anchor file, watch both render pacing controllers against a
//! simulated scene, or manage the configuration file.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use scenepacer::config::ConfigFile;
use scenepacer::logging::init_logging;

use commands::config::ConfigCommands;
use commands::declutter::DeclutterArgs;
use commands::simulate::SimulateArgs;

#[derive(Debug, Parser)]
#[command(name = "scenepacer")]
#[command(
    version,
    about = "Adaptive scene resource control for tiled globe renderers",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Place labels for an anchor file so they do not overlap
    Declutter(DeclutterArgs),

    /// Run the frame rate scheduler and tile freeze controller against a simulated scene
    Simulate(SimulateArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = ConfigFile::load().unwrap_or_default();

    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    let result = match cli.command {
        Commands::Declutter(args) => commands::declutter::run(args, &config),
        Commands::Simulate(args) => commands::simulate::run(args, &config),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
