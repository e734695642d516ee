//! Settings structs loaded from the configuration file.

use std::path::PathBuf;
use std::time::Duration;

use crate::loader::{
    LoaderConfigBuilder, DEFAULT_BATCH_SIZE, DEFAULT_NUM_WORKERS, DEFAULT_SHUTDOWN_CEILING,
    DEFAULT_TILE_SIZE,
};
use crate::model::prefetch_depth;
use crate::tiler::{TileSpec, TilerError, TilingPolicy};

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilebatch.log";

/// Default log level when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// All configuration sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub tiling: TilingSettings,
    pub pipeline: PipelineSettings,
    pub logging: LoggingSettings,
}

/// `[tiling]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TilingSettings {
    pub tile_width: u32,
    pub tile_height: u32,
    pub trim_to_parent: bool,
    pub symmetric: bool,
    pub filter_by_centroid: bool,
    /// Tile rows on the rayon pool.
    pub parallel: bool,
}

impl Default for TilingSettings {
    fn default() -> Self {
        let policy = TilingPolicy::default();
        Self {
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            trim_to_parent: policy.trim_to_parent,
            symmetric: policy.symmetric,
            filter_by_centroid: policy.filter_by_centroid,
            parallel: false,
        }
    }
}

impl TilingSettings {
    pub fn policy(&self) -> TilingPolicy {
        TilingPolicy {
            trim_to_parent: self.trim_to_parent,
            symmetric: self.symmetric,
            filter_by_centroid: self.filter_by_centroid,
        }
    }

    pub fn tile_spec(&self) -> Result<TileSpec, TilerError> {
        TileSpec::new(self.tile_width, self.tile_height, self.policy())
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub num_workers: usize,
    /// Explicit prefetch depth; derived from batch size and workers if unset.
    pub num_prefetch: Option<usize>,
    pub shutdown_ceiling: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            num_workers: DEFAULT_NUM_WORKERS,
            num_prefetch: None,
            shutdown_ceiling: DEFAULT_SHUTDOWN_CEILING,
        }
    }
}

impl PipelineSettings {
    /// Prefetch depth to use.
    pub fn effective_prefetch(&self) -> usize {
        self.num_prefetch
            .unwrap_or_else(|| prefetch_depth(self.batch_size, self.num_workers))
    }

    /// Loader builder preloaded with these settings.
    pub fn loader_builder(&self) -> LoaderConfigBuilder {
        crate::loader::LoaderConfig::builder()
            .batch_size(self.batch_size)
            .num_workers(self.num_workers)
            .num_prefetch(self.effective_prefetch())
            .shutdown_ceiling(self.shutdown_ceiling)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: DEFAULT_LOG_FILE.to_string(),
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Log directory under the platform's local data directory.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("tilebatch").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}
