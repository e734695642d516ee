use std::io;

use thiserror::Error;

use super::EngineError;
use crate::loader::LoaderError;
use crate::tile::TileError;

/// Fatal errors that end an inference run.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("Inference engine failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Engine returned {actual} results for a batch of {expected} tiles")]
    ResultCountMismatch { expected: usize, actual: usize },

    #[error("Output queue closed after {received} of {expected} loader workers finished")]
    WorkersLost { expected: usize, received: usize },

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error("Failed to build inference runtime: {0}")]
    Runtime(#[source] io::Error),
}
