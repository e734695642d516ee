//! In-memory region source.

use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView};

use super::{RegionError, RegionRequest, RegionSource};

/// Serves regions from a full-resolution image held in memory.
///
/// Downsampled reads crop at full resolution first and then scale the crop
/// with a triangle filter.
#[derive(Debug, Clone)]
pub struct ImageRegionSource {
    image: DynamicImage,
}

impl ImageRegionSource {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Returns the backing image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

impl From<DynamicImage> for ImageRegionSource {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

impl RegionSource for ImageRegionSource {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn color(&self) -> ColorType {
        self.image().color()
    }

    fn read_region(&self, request: &RegionRequest) -> Result<DynamicImage, RegionError> {
        if !request.downsample.is_finite() || request.downsample <= 0.0 {
            return Err(RegionError::InvalidDownsample(request.downsample));
        }
        if request.width == 0 || request.height == 0 {
            return Err(RegionError::EmptyRegion);
        }
        if !request.fits_within(self.width(), self.height()) {
            return Err(RegionError::OutOfBounds {
                x: request.x,
                y: request.y,
                width: request.width,
                height: request.height,
                image_width: self.width(),
                image_height: self.height(),
            });
        }

        let crop = self.image.crop_imm(
            request.x as u32,
            request.y as u32,
            request.width,
            request.height,
        );

        let (out_width, out_height) = request.output_size();
        if crop.dimensions() == (out_width, out_height) {
            Ok(crop)
        } else {
            Ok(crop.resize_exact(out_width, out_height, FilterType::Triangle))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> ImageRegionSource {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]));
        ImageRegionSource::new(DynamicImage::ImageRgb8(image))
    }

    #[test]
    fn test_direct_read() {
        let source = gradient(64, 32);
        let region = source
            .read_region(&RegionRequest::new(1.0, 10, 5, 8, 4))
            .unwrap();

        assert_eq!(region.dimensions(), (8, 4));
        let rgb = region.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([10, 5, 0]));
        assert_eq!(rgb.get_pixel(7, 3), &Rgb([17, 8, 0]));
    }

    #[test]
    fn test_downsampled_read() {
        let source = gradient(64, 64);
        let region = source
            .read_region(&RegionRequest::new(2.0, 0, 0, 32, 16))
            .unwrap();
        assert_eq!(region.dimensions(), (16, 8));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let source = gradient(16, 16);
        let result = source.read_region(&RegionRequest::new(1.0, 10, 10, 8, 8));
        assert!(matches!(result, Err(RegionError::OutOfBounds { .. })));
    }

    #[test]
    fn test_invalid_downsample_rejected() {
        let source = gradient(16, 16);
        let result = source.read_region(&RegionRequest::new(0.0, 0, 0, 8, 8));
        assert_eq!(result.unwrap_err(), RegionError::InvalidDownsample(0.0));
    }
}
