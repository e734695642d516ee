//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tilebatch::config::ConfigFileError;
use tilebatch::model::ModelConfigError;
use tilebatch::tiler::TilerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file error
    Config(ConfigFileError),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Boundary file could not be interpreted
    Boundary(String),
    /// Tiling parameters rejected
    Tiler(TilerError),
    /// Model configuration or plan rejected
    Model(ModelConfigError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Boundary(_) => {
                eprintln!();
                eprintln!("The boundary file must be a JSON array of polygons, each a list of");
                eprintln!("rings, each a list of [x, y] points. The first ring is the exterior:");
                eprintln!("  [[[[0, 0], [100, 0], [100, 50], [0, 50]]]]");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Use 'tilebatch config path' to locate the configuration file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path.display(), error)
            }
            CliError::Boundary(msg) => write!(f, "Invalid boundary: {}", msg),
            CliError::Tiler(e) => write!(f, "Tiling error: {}", e),
            CliError::Model(e) => write!(f, "Model error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::Tiler(e) => Some(e),
            CliError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<TilerError> for CliError {
    fn from(e: TilerError) -> Self {
        CliError::Tiler(e)
    }
}

impl From<ModelConfigError> for CliError {
    fn from(e: ModelConfigError) -> Self {
        CliError::Model(e)
    }
}
