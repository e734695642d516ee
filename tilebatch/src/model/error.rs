use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::loader::LoaderConfigError;
use crate::tiler::TilerError;

/// Errors loading a model configuration or deriving a plan from it.
#[derive(Debug, Error)]
pub enum ModelConfigError {
    #[error("Failed to read model configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid model configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model declares {declared} classes but names {named}")]
    ClassCountMismatch { declared: usize, named: usize },

    #[error("Model declares no classes")]
    NoClasses,

    #[error("Duplicate class name '{0}'")]
    DuplicateClass(String),

    #[error("Patch size must be > 0")]
    ZeroPatchSize,

    #[error("Invalid spacing {0} µm/px: must be finite and > 0")]
    InvalidSpacing(f64),

    #[error("Invalid pixel size {0} µm: must be finite and > 0")]
    InvalidPixelSize(f64),

    #[error("Invalid '{transform}' transform: {reason}")]
    InvalidTransform { transform: String, reason: String },

    #[error(transparent)]
    Loader(#[from] LoaderConfigError),

    #[error(transparent)]
    Tiler(#[from] TilerError),
}
