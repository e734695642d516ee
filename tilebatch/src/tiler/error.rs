//! Error types for tiling operations.

use thiserror::Error;

/// Errors that can occur while configuring or running the tiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TilerError {
    /// Tile dimensions must both be positive.
    #[error("Invalid tile size {width}×{height}: dimensions must be > 0")]
    InvalidTileSize { width: u32, height: u32 },

    /// A boundary ring could not be built from the supplied coordinates.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// The overlay engine failed while clipping a cell against the boundary.
    ///
    /// This is recoverable: the affected cell is dropped and tiling continues.
    #[error("Topology failure while trimming tile: {0}")]
    Topology(String),
}
