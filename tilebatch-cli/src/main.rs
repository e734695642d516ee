//! TileBatch CLI - Command-line interface
//!
//! This binary provides a command-line interface to the TileBatch library:
//! tiling boundary polygons and planning inference runs for a model.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilebatch::config::ConfigFile;
use tilebatch::logging::{init_logging, LoggingGuard};
use tracing::debug;

use commands::config::ConfigCommands;
use commands::plan::PlanArgs;
use commands::tile::TileArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilebatch")]
#[command(version = tilebatch::VERSION)]
#[command(about = "Polygon tiling and batched tile inference", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/tilebatch/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable the log file and console logging
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a boundary polygon into tiles and print them as JSON
    Tile(TileArgs),

    /// Derive tiling and loader settings from a model configuration
    Plan(PlanArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let _guard = if cli.quiet {
        None
    } else {
        Some(start_logging(&config)?)
    };
    debug!(version = tilebatch::VERSION, "tilebatch starting");

    match &cli.command {
        Commands::Tile(args) => commands::tile::run(args, &config.tiling),
        Commands::Plan(args) => commands::plan::run(args, &config.pipeline),
        Commands::Config(command) => {
            commands::config::run(command, cli.config.as_deref(), &config);
            Ok(())
        }
    }
}

fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    let logging = &config.logging;
    init_logging(&logging.directory, &logging.file, &logging.level)
        .map_err(|e| CliError::LoggingInit(e.to_string()))
}
