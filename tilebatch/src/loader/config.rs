//! Loader configuration.

use std::time::Duration;

use super::LoaderConfigError;
use crate::region::TileReader;

/// Default number of tiles per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1;

/// Default number of worker threads.
pub const DEFAULT_NUM_WORKERS: usize = 4;

/// Default number of batches each worker may have queued.
pub const DEFAULT_NUM_PREFETCH: usize = 2;

/// Default full-resolution tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default upper bound on how long shutdown waits for workers.
pub const DEFAULT_SHUTDOWN_CEILING: Duration = Duration::from_secs(10);

/// Validated configuration for a [`TileLoader`](super::TileLoader).
///
/// # Example
///
/// ```
/// use tilebatch::loader::LoaderConfig;
///
/// let config = LoaderConfig::builder()
///     .batch_size(8)
///     .num_workers(3)
///     .num_prefetch(2)
///     .tile_size(224, 224)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.queue_capacity(), 6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    batch_size: usize,
    num_workers: usize,
    num_prefetch: usize,
    tile_width: u32,
    tile_height: u32,
    downsample: f64,
    resize: Option<(u32, u32)>,
    shutdown_ceiling: Duration,
}

impl LoaderConfig {
    /// Create a new configuration builder.
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn num_prefetch(&self) -> usize {
        self.num_prefetch
    }

    /// Full-resolution tile width read around each centroid.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Full-resolution tile height read around each centroid.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn downsample(&self) -> f64 {
        self.downsample
    }

    /// Final image size handed to the engine, if resizing.
    pub fn resize(&self) -> Option<(u32, u32)> {
        self.resize
    }

    pub fn shutdown_ceiling(&self) -> Duration {
        self.shutdown_ceiling
    }

    /// Output queue capacity, `num_workers × num_prefetch`.
    pub fn queue_capacity(&self) -> usize {
        self.num_workers * self.num_prefetch
    }

    /// Tile reader matching this configuration.
    pub fn reader(&self) -> TileReader {
        TileReader::new(self.tile_width, self.tile_height, self.downsample, self.resize)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            num_workers: DEFAULT_NUM_WORKERS,
            num_prefetch: DEFAULT_NUM_PREFETCH,
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            downsample: 1.0,
            resize: None,
            shutdown_ceiling: DEFAULT_SHUTDOWN_CEILING,
        }
    }
}

/// Builder for [`LoaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.config.num_workers = num_workers;
        self
    }

    pub fn num_prefetch(mut self, num_prefetch: usize) -> Self {
        self.config.num_prefetch = num_prefetch;
        self
    }

    /// Sets the full-resolution tile size.
    pub fn tile_size(mut self, width: u32, height: u32) -> Self {
        self.config.tile_width = width;
        self.config.tile_height = height;
        self
    }

    pub fn downsample(mut self, downsample: f64) -> Self {
        self.config.downsample = downsample;
        self
    }

    /// Resizes every tile to `width × height` after reading.
    pub fn resize(mut self, width: u32, height: u32) -> Self {
        self.config.resize = Some((width, height));
        self
    }

    pub fn shutdown_ceiling(mut self, ceiling: Duration) -> Self {
        self.config.shutdown_ceiling = ceiling;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<LoaderConfig, LoaderConfigError> {
        let config = self.config;

        if config.batch_size == 0 {
            return Err(LoaderConfigError::ZeroBatchSize);
        }
        if config.num_workers == 0 {
            return Err(LoaderConfigError::ZeroWorkers);
        }
        if config.num_prefetch == 0 {
            return Err(LoaderConfigError::ZeroPrefetch);
        }
        if config.tile_width == 0 || config.tile_height == 0 {
            return Err(LoaderConfigError::InvalidTileSize {
                width: config.tile_width,
                height: config.tile_height,
            });
        }
        if !config.downsample.is_finite() || config.downsample <= 0.0 {
            return Err(LoaderConfigError::InvalidDownsample(config.downsample));
        }
        if let Some((width, height)) = config.resize {
            if width == 0 || height == 0 {
                return Err(LoaderConfigError::InvalidResize { width, height });
            }
        }

        Ok(config)
    }
}
