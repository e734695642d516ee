//! Per-tile pixel reads.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView};
use tracing::warn;

use super::{RegionError, RegionRequest, RegionSource};
use crate::tile::TileDescriptor;

/// Reads the pixels of one tile centred on its descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileReader {
    tile_width: u32,
    tile_height: u32,
    downsample: f64,
    resize: Option<(u32, u32)>,
}

impl TileReader {
    /// Creates a reader for `tile_width × tile_height` full-resolution
    /// rectangles read at `downsample`, optionally resized afterwards.
    pub fn new(tile_width: u32, tile_height: u32, downsample: f64, resize: Option<(u32, u32)>) -> Self {
        Self {
            tile_width,
            tile_height,
            downsample,
            resize,
        }
    }

    /// Full-resolution rectangle centred on `(cx, cy)`.
    pub fn request_for(&self, cx: f64, cy: f64) -> RegionRequest {
        let x = (cx - self.tile_width as f64 / 2.0).round() as i64;
        let y = (cy - self.tile_height as f64 / 2.0).round() as i64;
        RegionRequest::new(self.downsample, x, y, self.tile_width, self.tile_height)
    }

    /// Reads the tile for a descriptor.
    pub fn read(
        &self,
        source: &dyn RegionSource,
        descriptor: &TileDescriptor,
    ) -> Result<DynamicImage, RegionError> {
        let centroid = descriptor.centroid();
        let request = self.request_for(centroid.x, centroid.y);

        let image = if request.fits_within(source.width(), source.height()) {
            source.read_region(&request)?
        } else {
            warn!(
                tile = %descriptor.id(),
                x = request.x,
                y = request.y,
                "Detected out-of-bounds tile request - results may be influenced by padding"
            );
            read_padded(source, &request)?
        };

        Ok(match self.resize {
            Some((width, height)) if image.dimensions() != (width, height) => {
                image.resize_exact(width, height, FilterType::Triangle)
            }
            _ => image,
        })
    }
}

/// Reads the part of `request` that overlaps the image and pastes it onto a
/// zero-filled canvas of the full output size.
///
/// The canvas takes the pixel layout of the overlap, or of the source when
/// the request misses the image entirely, so padded tiles match direct ones.
fn read_padded(
    source: &dyn RegionSource,
    request: &RegionRequest,
) -> Result<DynamicImage, RegionError> {
    let (out_width, out_height) = request.output_size();

    let x0 = request.x.max(0);
    let y0 = request.y.max(0);
    let x1 = (request.x + request.width as i64).min(source.width() as i64);
    let y1 = (request.y + request.height as i64).min(source.height() as i64);

    if x1 <= x0 || y1 <= y0 {
        return Ok(DynamicImage::new(out_width, out_height, source.color()));
    }

    let overlap = RegionRequest::new(
        request.downsample,
        x0,
        y0,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    );
    let patch = source.read_region(&overlap)?;
    let dx = ((x0 - request.x) as f64 / request.downsample).round() as i64;
    let dy = ((y0 - request.y) as f64 / request.downsample).round() as i64;

    let mut canvas = DynamicImage::new(out_width, out_height, patch.color());
    paste(&mut canvas, &patch, dx, dy);
    Ok(canvas)
}

/// Copies `patch` into `canvas` at `(x, y)` without blending, keeping the
/// native sample type when both share a layout.
fn paste(canvas: &mut DynamicImage, patch: &DynamicImage, x: i64, y: i64) {
    use DynamicImage as D;

    match (canvas, patch) {
        (D::ImageLuma8(c), D::ImageLuma8(p)) => imageops::replace(c, p, x, y),
        (D::ImageLumaA8(c), D::ImageLumaA8(p)) => imageops::replace(c, p, x, y),
        (D::ImageRgb8(c), D::ImageRgb8(p)) => imageops::replace(c, p, x, y),
        (D::ImageRgba8(c), D::ImageRgba8(p)) => imageops::replace(c, p, x, y),
        (D::ImageLuma16(c), D::ImageLuma16(p)) => imageops::replace(c, p, x, y),
        (D::ImageLumaA16(c), D::ImageLumaA16(p)) => imageops::replace(c, p, x, y),
        (D::ImageRgb16(c), D::ImageRgb16(p)) => imageops::replace(c, p, x, y),
        (D::ImageRgba16(c), D::ImageRgba16(p)) => imageops::replace(c, p, x, y),
        (D::ImageRgb32F(c), D::ImageRgb32F(p)) => imageops::replace(c, p, x, y),
        (D::ImageRgba32F(c), D::ImageRgba32F(p)) => imageops::replace(c, p, x, y),
        (c, p) => imageops::replace(c, p, x, y),
    }
}
