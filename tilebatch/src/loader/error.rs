use std::io;

use thiserror::Error;

/// Invalid loader configuration, reported by [`LoaderConfigBuilder::build`].
///
/// [`LoaderConfigBuilder::build`]: super::LoaderConfigBuilder::build
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderConfigError {
    #[error("Batch size must be at least 1")]
    ZeroBatchSize,

    #[error("Number of workers must be at least 1")]
    ZeroWorkers,

    #[error("Number of prefetched batches per worker must be at least 1")]
    ZeroPrefetch,

    #[error("Invalid tile size {width}×{height}: dimensions must be > 0")]
    InvalidTileSize { width: u32, height: u32 },

    #[error("Invalid downsample {0}: must be finite and > 0")]
    InvalidDownsample(f64),

    #[error("Invalid resize {width}×{height}: dimensions must be > 0")]
    InvalidResize { width: u32, height: u32 },
}

/// Errors starting the loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Failed to spawn loader worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },
}
