//! `tilebatch tile` - split a boundary polygon into tiles.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::{json, Value};
use tilebatch::config::TilingSettings;
use tilebatch::tile::descriptors_from_regions;
use tilebatch::tiler::{Boundary, TilePolygon, Tiler};
use tracing::info;

use crate::error::CliError;

/// Arguments for the tile command.
#[derive(Debug, Args)]
pub struct TileArgs {
    /// JSON file holding the boundary polygons
    #[arg(long)]
    pub boundary: PathBuf,

    /// Tile width in pixels (default from config)
    #[arg(long)]
    pub width: Option<u32>,

    /// Tile height in pixels (default from config)
    #[arg(long)]
    pub height: Option<u32>,

    /// Clip partially covered tiles to the boundary
    #[arg(long, overrides_with = "no_trim")]
    pub trim: bool,

    /// Keep partially covered tiles whole
    #[arg(long)]
    pub no_trim: bool,

    /// Centre the grid on each region's envelope
    #[arg(long, overrides_with = "asymmetric")]
    pub symmetric: bool,

    /// Anchor the grid at each region's top-left corner
    #[arg(long)]
    pub asymmetric: bool,

    /// Keep partially covered tiles only if their centre is inside
    #[arg(long, overrides_with = "no_filter_by_centroid")]
    pub filter_by_centroid: bool,

    /// Keep partially covered tiles regardless of their centre
    #[arg(long)]
    pub no_filter_by_centroid: bool,

    /// Tile rows in parallel (output order unspecified)
    #[arg(long, overrides_with = "sequential")]
    pub parallel: bool,

    /// Tile rows on the calling thread
    #[arg(long)]
    pub sequential: bool,

    /// Tile all polygons as one region with a shared grid and numbering
    #[arg(long)]
    pub merge_regions: bool,
}

/// Resolves an on/off flag pair over a configured value.
fn toggle(on: bool, off: bool, configured: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}

impl TileArgs {
    /// Overlays command-line flags on the configured tiling settings.
    pub fn settings(&self, base: &TilingSettings) -> TilingSettings {
        TilingSettings {
            tile_width: self.width.unwrap_or(base.tile_width),
            tile_height: self.height.unwrap_or(base.tile_height),
            trim_to_parent: toggle(self.trim, self.no_trim, base.trim_to_parent),
            symmetric: toggle(self.symmetric, self.asymmetric, base.symmetric),
            filter_by_centroid: toggle(
                self.filter_by_centroid,
                self.no_filter_by_centroid,
                base.filter_by_centroid,
            ),
            parallel: toggle(self.parallel, self.sequential, base.parallel),
        }
    }
}

/// Run the tile command.
pub fn run(args: &TileArgs, base: &TilingSettings) -> Result<(), CliError> {
    let settings = args.settings(base);
    let boundary = load_boundary(&args.boundary)?;
    let tiler = Tiler::new(settings.tile_spec()?);

    let regions = if args.merge_regions {
        vec![boundary]
    } else {
        boundary.regions()
    };
    let tiles: Vec<Vec<TilePolygon>> = regions
        .iter()
        .map(|region| {
            if settings.parallel {
                tiler.tile_par(region)
            } else {
                tiler.tile(region)
            }
        })
        .collect();

    info!(
        regions = tiles.len(),
        tiles = tiles.iter().map(Vec::len).sum::<usize>(),
        tile_width = settings.tile_width,
        tile_height = settings.tile_height,
        "Tiled boundary"
    );

    let output = tiles_to_json(&settings, tiles);
    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
    );
    Ok(())
}

/// Reads a boundary file: polygons → rings → `[x, y]` points.
pub fn load_boundary(path: &Path) -> Result<Boundary, CliError> {
    let text = fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.to_path_buf(),
        error,
    })?;
    parse_boundary(&text)
}

pub fn parse_boundary(text: &str) -> Result<Boundary, CliError> {
    let rings: Vec<Vec<Vec<[f64; 2]>>> =
        serde_json::from_str(text).map_err(|e| CliError::Boundary(e.to_string()))?;
    Ok(Boundary::from_rings(rings)?)
}

fn tiles_to_json(settings: &TilingSettings, regions: Vec<Vec<TilePolygon>>) -> Value {
    let trimmed: Vec<bool> = regions
        .iter()
        .flatten()
        .map(TilePolygon::is_trimmed)
        .collect();
    let descriptors = descriptors_from_regions(regions);

    let entries: Vec<Value> = descriptors
        .iter()
        .zip(trimmed)
        .map(|(descriptor, trimmed)| {
            let centroid = descriptor.centroid();
            let bounds = descriptor
                .bounds()
                .map(|r| json!([r.min().x, r.min().y, r.max().x, r.max().y]));
            json!({
                "name": descriptor.name(),
                "region": descriptor.region(),
                "centroid": [centroid.x, centroid.y],
                "bounds": bounds,
                "trimmed": trimmed,
            })
        })
        .collect();

    json!({
        "count": entries.len(),
        "tile_width": settings.tile_width,
        "tile_height": settings.tile_height,
        "tiles": entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(width: Option<u32>) -> TileArgs {
        TileArgs {
            boundary: PathBuf::from("unused.json"),
            width,
            height: None,
            trim: false,
            no_trim: false,
            symmetric: false,
            asymmetric: true,
            filter_by_centroid: false,
            no_filter_by_centroid: false,
            parallel: false,
            sequential: false,
            merge_regions: false,
        }
    }

    #[test]
    fn test_flags_overlay_config() {
        let settings = args(Some(20)).settings(&TilingSettings::default());
        assert_eq!(settings.tile_width, 20);
        assert_eq!(settings.tile_height, 256);
        assert!(!settings.symmetric);
        assert!(!settings.trim_to_parent);
    }

    #[test]
    fn test_parse_boundary() {
        let boundary = parse_boundary("[[[[0, 0], [100, 0], [100, 50], [0, 50]]]]").unwrap();
        assert_eq!(boundary.area(), 5000.0);
    }

    #[test]
    fn test_parse_boundary_rejects_garbage() {
        assert!(matches!(
            parse_boundary("{\"not\": \"rings\"}"),
            Err(CliError::Boundary(_))
        ));
        assert!(matches!(
            parse_boundary("[[[[0, 0], [1, 1]]]]"),
            Err(CliError::Tiler(_))
        ));
    }

    #[test]
    fn test_load_boundary_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boundary.json");
        fs::write(&path, "[[[[0, 0], [40, 0], [40, 40], [0, 40]]]]").unwrap();

        let boundary = load_boundary(&path).unwrap();
        assert_eq!(boundary.area(), 1600.0);

        assert!(matches!(
            load_boundary(&dir.path().join("missing.json")),
            Err(CliError::FileRead { .. })
        ));
    }

    #[test]
    fn test_json_output() {
        let settings = args(Some(20)).settings(&TilingSettings {
            tile_height: 25,
            ..TilingSettings::default()
        });
        let boundary = parse_boundary("[[[[0, 0], [100, 0], [100, 50], [0, 50]]]]").unwrap();
        let tiles = Tiler::new(settings.tile_spec().unwrap()).tile(&boundary);

        let output = tiles_to_json(&settings, vec![tiles]);
        assert_eq!(output["count"], 10);
        assert_eq!(output["tiles"][0]["name"], "Tile 0");
        assert_eq!(output["tiles"][0]["region"], 0);
        assert_eq!(output["tiles"][0]["centroid"], json!([10.0, 12.5]));
        assert_eq!(output["tiles"][0]["trimmed"], false);
    }

    #[test]
    fn test_off_flags_override_config() {
        let base = TilingSettings {
            trim_to_parent: true,
            symmetric: false,
            filter_by_centroid: true,
            parallel: true,
            ..TilingSettings::default()
        };
        let mut flags = args(None);
        flags.asymmetric = false;
        flags.no_trim = true;
        flags.symmetric = true;
        flags.no_filter_by_centroid = true;
        flags.sequential = true;

        let settings = flags.settings(&base);
        assert!(!settings.trim_to_parent);
        assert!(settings.symmetric);
        assert!(!settings.filter_by_centroid);
        assert!(!settings.parallel);

        // Neither flag of a pair keeps the configured value.
        let untouched = TileArgs {
            asymmetric: false,
            ..args(None)
        }
        .settings(&base);
        assert!(untouched.trim_to_parent);
        assert!(!untouched.symmetric);
        assert!(untouched.filter_by_centroid);
        assert!(untouched.parallel);
    }

    #[test]
    fn test_flag_pairs_parse_last_wins() {
        use clap::Parser;

        #[derive(Parser)]
        struct Cli {
            #[command(flatten)]
            tile: TileArgs,
        }

        let cli = Cli::try_parse_from([
            "tile",
            "--boundary",
            "b.json",
            "--trim",
            "--no-trim",
            "--asymmetric",
        ])
        .unwrap();
        let settings = cli.tile.settings(&TilingSettings {
            trim_to_parent: true,
            ..TilingSettings::default()
        });
        assert!(!settings.trim_to_parent);
        assert!(!settings.symmetric);
    }

    #[test]
    fn test_regions_numbered_separately() {
        let settings = args(Some(20)).settings(&TilingSettings {
            tile_height: 20,
            ..TilingSettings::default()
        });
        let boundary = parse_boundary(
            "[[[[0, 0], [40, 0], [40, 20], [0, 20]]], [[[100, 0], [120, 0], [120, 20], [100, 20]]]]",
        )
        .unwrap();
        let tiler = Tiler::new(settings.tile_spec().unwrap());
        let tiles = tiler.tile_regions(&boundary.regions());

        let output = tiles_to_json(&settings, tiles);
        assert_eq!(output["count"], 3);
        let names: Vec<(&str, u64)> = output["tiles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| (t["name"].as_str().unwrap(), t["region"].as_u64().unwrap()))
            .collect();
        assert_eq!(names, vec![("Tile 0", 0), ("Tile 1", 0), ("Tile 0", 1)]);
        assert_eq!(output["tiles"][2]["bounds"], json!([100.0, 0.0, 120.0, 20.0]));
    }
}
