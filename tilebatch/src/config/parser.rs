//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tiling] section
    if let Some(section) = ini.section(Some("tiling")) {
        let s = Section::new("tiling", section);
        if let Some(v) = s.positive("tile_width")? {
            config.tiling.tile_width = v;
        }
        if let Some(v) = s.positive("tile_height")? {
            config.tiling.tile_height = v;
        }
        if let Some(v) = s.boolean("trim_to_parent")? {
            config.tiling.trim_to_parent = v;
        }
        if let Some(v) = s.boolean("symmetric")? {
            config.tiling.symmetric = v;
        }
        if let Some(v) = s.boolean("filter_by_centroid")? {
            config.tiling.filter_by_centroid = v;
        }
        if let Some(v) = s.boolean("parallel")? {
            config.tiling.parallel = v;
        }
    }

    // [pipeline] section
    if let Some(section) = ini.section(Some("pipeline")) {
        let s = Section::new("pipeline", section);
        if let Some(v) = s.positive("batch_size")? {
            config.pipeline.batch_size = v;
        }
        if let Some(v) = s.positive("num_workers")? {
            config.pipeline.num_workers = v;
        }
        if let Some(v) = s.get("num_prefetch") {
            if !v.eq_ignore_ascii_case("auto") {
                config.pipeline.num_prefetch = Some(s.parse_positive("num_prefetch", v)?);
            }
        }
        if let Some(v) = s.positive::<u64>("shutdown_timeout")? {
            config.pipeline.shutdown_ceiling = Duration::from_secs(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        let s = Section::new("logging", section);
        if let Some(v) = s.get("directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = s.get("file") {
            config.logging.file = v.to_string();
        }
        if let Some(v) = s.get("level") {
            let level = v.to_lowercase();
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(s.invalid("level", v, "must be one of: trace, debug, info, warn, error"));
            }
            config.logging.level = level;
        }
    }

    Ok(config)
}

/// One INI section, with the name needed for error reporting.
struct Section<'a> {
    name: &'static str,
    properties: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, properties: &'a Properties) -> Self {
        Self { name, properties }
    }

    /// Trimmed non-empty value for `key`.
    fn get(&self, key: &str) -> Option<&'a str> {
        self.properties
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>, ConfigFileError> {
        let Some(v) = self.get(key) else {
            return Ok(None);
        };
        match v.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(self.invalid(key, v, "must be true or false")),
        }
    }

    fn positive<T>(&self, key: &str) -> Result<Option<T>, ConfigFileError>
    where
        T: FromStr + PartialOrd + Default,
    {
        self.get(key)
            .map(|v| self.parse_positive(key, v))
            .transpose()
    }

    fn parse_positive<T>(&self, key: &str, v: &str) -> Result<T, ConfigFileError>
    where
        T: FromStr + PartialOrd + Default,
    {
        match v.parse::<T>() {
            Ok(n) if n > T::default() => Ok(n),
            _ => Err(self.invalid(key, v, "must be a positive integer")),
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
