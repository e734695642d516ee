use thiserror::Error;

/// Errors raised while reading pixel regions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error(
        "Region {width}×{height} at ({x}, {y}) is outside the {image_width}×{image_height} image"
    )]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("Invalid downsample {0}: must be finite and > 0")]
    InvalidDownsample(f64),

    #[error("Region has zero size")]
    EmptyRegion,

    #[error("Failed to read region: {0}")]
    Read(String),
}
