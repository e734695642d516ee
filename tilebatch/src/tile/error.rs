//! Error types for tile descriptors and classification results.

use thiserror::Error;

use super::TileId;

/// Errors raised while building or attaching classification results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    /// A class name appeared twice in one result.
    #[error("Duplicate class name in classification: {0}")]
    DuplicateClass(String),

    /// Number of scores does not match the number of class names.
    #[error("Expected {expected} class scores, got {actual}")]
    ScoreCountMismatch { expected: usize, actual: usize },

    /// A result was already attached to this tile.
    #[error("Tile {0} already has a classification")]
    AlreadyClassified(TileId),
}
