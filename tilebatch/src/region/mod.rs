//! Region reading abstraction.
//!
//! The loader never touches pixel storage directly. It asks a
//! [`RegionSource`] for rectangles of the full-resolution image, and the
//! [`TileReader`] decides how each tile is read.
//!
//! ```text
//! ┌──────────────────┐
//! │   Loader worker  │
//! └────────┬─────────┘
//!          │ descriptor centroid
//!          ▼
//! ┌──────────────────┐   fits?   ┌──────────────────────┐
//! │    TileReader    │──────────►│ direct read_region   │
//! │                  │   no      ├──────────────────────┤
//! │                  │──────────►│ padded read + canvas │
//! └────────┬─────────┘           └──────────────────────┘
//!          │ optional resize
//!          ▼
//!     DynamicImage
//! ```
//!
//! Sources must be callable from several worker threads at once, hence the
//! `Send + Sync` bound on [`RegionSource`].

mod error;
mod image_source;
mod reader;

pub use error::RegionError;
pub use image_source::ImageRegionSource;
pub use reader::TileReader;

use image::{ColorType, DynamicImage};

/// A pixel rectangle in full-resolution coordinates plus the downsample to
/// read it at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRequest {
    /// Ratio between full-resolution pixels and output pixels.
    pub downsample: f64,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl RegionRequest {
    pub fn new(downsample: f64, x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            downsample,
            x,
            y,
            width,
            height,
        }
    }

    /// Size of the pixel buffer produced for this request.
    pub fn output_size(&self) -> (u32, u32) {
        (
            scaled(self.width, self.downsample),
            scaled(self.height, self.downsample),
        )
    }

    /// Returns true if the rectangle lies entirely inside an image of the
    /// given full-resolution size.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width as i64 <= image_width as i64
            && self.y + self.height as i64 <= image_height as i64
    }
}

fn scaled(length: u32, downsample: f64) -> u32 {
    ((length as f64 / downsample).round() as u32).max(1)
}

/// Host-supplied access to image pixels.
pub trait RegionSource: Send + Sync {
    /// Full-resolution width in pixels.
    fn width(&self) -> u32;

    /// Full-resolution height in pixels.
    fn height(&self) -> u32;

    /// Pixel layout of the buffers this source returns.
    ///
    /// Used for the padding canvas when a tile lies entirely outside the
    /// image and nothing is read.
    fn color(&self) -> ColorType {
        ColorType::Rgb8
    }

    /// Reads a rectangle that lies inside the image.
    fn read_region(&self, request: &RegionRequest) -> Result<DynamicImage, RegionError>;
}
