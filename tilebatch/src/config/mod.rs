//! Configuration file for tiling and pipeline defaults.
//!
//! Settings live in an INI file, by default
//! `<config dir>/tilebatch/config.ini`. Every key is optional; missing keys
//! keep their defaults.
//!
//! ```ini
//! [tiling]
//! tile_width = 256
//! tile_height = 256
//! trim_to_parent = false
//! symmetric = true
//! filter_by_centroid = false
//! parallel = false
//!
//! [pipeline]
//! batch_size = 8
//! num_workers = 4
//! num_prefetch = auto
//! shutdown_timeout = 10
//!
//! [logging]
//! directory = ~/.local/share/tilebatch/logs
//! file = tilebatch.log
//! level = info
//! ```

mod file;
mod parser;
mod settings;

pub use file::{config_file_path, ConfigFileError, CONFIG_FILE_NAME};
pub use settings::{
    default_log_dir, ConfigFile, LoggingSettings, PipelineSettings, TilingSettings,
    DEFAULT_LOG_FILE, DEFAULT_LOG_LEVEL,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiler::TilingPolicy;

    #[test]
    fn test_default_tiling_matches_inference_policy() {
        let spec = ConfigFile::default().tiling.tile_spec().unwrap();
        assert_eq!(spec.policy(), TilingPolicy::default());
        assert_eq!((spec.tile_width(), spec.tile_height()), (256, 256));
    }

    #[test]
    fn test_pipeline_builds_loader_config() {
        let config = ConfigFile::from_ini_str("[pipeline]\nbatch_size = 4\nnum_workers = 2\n")
            .unwrap();
        let loader = config.pipeline.loader_builder().build().unwrap();

        assert_eq!(loader.batch_size(), 4);
        assert_eq!(loader.num_workers(), 2);
        assert_eq!(loader.num_prefetch(), 4);
        assert_eq!(loader.queue_capacity(), 8);
    }

    #[test]
    fn test_zero_tile_size_rejected_by_spec() {
        let mut config = ConfigFile::default();
        config.tiling.tile_width = 0;
        assert!(config.tiling.tile_spec().is_err());
    }
}
