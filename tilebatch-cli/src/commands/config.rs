//! Configuration inspection commands.

use std::path::Path;

use clap::Subcommand;
use tilebatch::config::{config_file_path, ConfigFile};

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: &ConfigCommands, path: Option<&Path>, config: &ConfigFile) {
    match command {
        ConfigCommands::Path => {
            let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            for line in describe(config) {
                println!("{}", line);
            }
        }
    }
}

fn describe(config: &ConfigFile) -> Vec<String> {
    let tiling = &config.tiling;
    let pipeline = &config.pipeline;
    let logging = &config.logging;
    let prefetch = match pipeline.num_prefetch {
        Some(n) => n.to_string(),
        None => format!("auto ({})", pipeline.effective_prefetch()),
    };

    vec![
        "[tiling]".to_string(),
        format!("tile_width = {}", tiling.tile_width),
        format!("tile_height = {}", tiling.tile_height),
        format!("trim_to_parent = {}", tiling.trim_to_parent),
        format!("symmetric = {}", tiling.symmetric),
        format!("filter_by_centroid = {}", tiling.filter_by_centroid),
        format!("parallel = {}", tiling.parallel),
        String::new(),
        "[pipeline]".to_string(),
        format!("batch_size = {}", pipeline.batch_size),
        format!("num_workers = {}", pipeline.num_workers),
        format!("num_prefetch = {}", prefetch),
        format!("shutdown_timeout = {}", pipeline.shutdown_ceiling.as_secs()),
        String::new(),
        "[logging]".to_string(),
        format!("directory = {}", logging.directory.display()),
        format!("file = {}", logging.file),
        format!("level = {}", logging.level),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_defaults() {
        let lines = describe(&ConfigFile::default());
        assert!(lines.contains(&"tile_width = 256".to_string()));
        assert!(lines.contains(&"num_prefetch = auto (2)".to_string()));
        assert!(lines.contains(&"level = info".to_string()));
    }
}
