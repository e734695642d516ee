//! Deriving tiling and loading parameters from a model.

use tracing::{debug, warn};

use super::{ModelConfigError, ModelConfiguration};
use crate::config::PipelineSettings;
use crate::loader::LoaderConfig;
use crate::tiler::{TileSpec, TilingPolicy};

/// Physical pixel size of the image being processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCalibration {
    pixel_width_um: f64,
    pixel_height_um: f64,
}

impl PixelCalibration {
    pub fn new(pixel_width_um: f64, pixel_height_um: f64) -> Result<Self, ModelConfigError> {
        for size in [pixel_width_um, pixel_height_um] {
            if !size.is_finite() || size <= 0.0 {
                return Err(ModelConfigError::InvalidPixelSize(size));
            }
        }
        Ok(Self {
            pixel_width_um,
            pixel_height_um,
        })
    }

    /// Square pixels of `pixel_size_um`.
    pub fn square(pixel_size_um: f64) -> Result<Self, ModelConfigError> {
        Self::new(pixel_size_um, pixel_size_um)
    }

    pub fn pixel_width_um(&self) -> f64 {
        self.pixel_width_um
    }

    pub fn pixel_height_um(&self) -> f64 {
        self.pixel_height_um
    }

    /// Mean of width and height.
    pub fn averaged(&self) -> f64 {
        (self.pixel_width_um + self.pixel_height_um) / 2.0
    }
}

/// Everything needed to tile an image and feed it to a model.
#[derive(Debug, Clone, PartialEq)]
pub struct InferencePlan {
    tile_spec: TileSpec,
    loader: LoaderConfig,
    class_names: Vec<String>,
    apply_softmax: bool,
}

impl InferencePlan {
    /// Derives a plan for running `model` on an image.
    ///
    /// Without a calibration the image is assumed to already be at the
    /// model's spacing, so patches are read 1:1. The prefetch depth is
    /// derived from `batch_size` and `num_workers`.
    pub fn new(
        model: &ModelConfiguration,
        calibration: Option<PixelCalibration>,
        batch_size: usize,
        num_workers: usize,
    ) -> Result<Self, ModelConfigError> {
        let pipeline = PipelineSettings {
            batch_size,
            num_workers,
            ..PipelineSettings::default()
        };
        Self::with_pipeline(model, calibration, &pipeline)
    }

    /// Like [`InferencePlan::new`], but takes batch size, worker count,
    /// prefetch depth and shutdown ceiling from `pipeline`.
    pub fn with_pipeline(
        model: &ModelConfiguration,
        calibration: Option<PixelCalibration>,
        pipeline: &PipelineSettings,
    ) -> Result<Self, ModelConfigError> {
        model.validate()?;

        let patch = model.patch_size_pixels as f64;
        let (downsample, tile_width, tile_height) = match calibration {
            Some(cal) => {
                let tile_microns = patch * model.spacing_um_px;
                (
                    model.spacing_um_px / cal.averaged(),
                    (tile_microns / cal.pixel_width_um() + 0.5) as u32,
                    (tile_microns / cal.pixel_height_um() + 0.5) as u32,
                )
            }
            None => {
                warn!("Pixel calibration not available, so using pixels instead of microns");
                (1.0, model.patch_size_pixels, model.patch_size_pixels)
            }
        };

        let read_size = (patch * downsample).round() as u32;

        for name in model.other_transforms() {
            debug!(transform = name, "Transform applied by engine, not loader");
        }

        let mut builder = pipeline
            .loader_builder()
            .tile_size(read_size, read_size)
            .downsample(downsample);
        if let Some((width, height)) = model.resize_size()? {
            builder = builder.resize(width, height);
        }

        Ok(Self {
            tile_spec: TileSpec::new(tile_width, tile_height, TilingPolicy::default())?,
            loader: builder.build()?,
            class_names: model.class_names.clone(),
            apply_softmax: model.apply_softmax,
        })
    }

    /// Tiler settings for annotations on the image.
    pub fn tile_spec(&self) -> &TileSpec {
        &self.tile_spec
    }

    /// Loader settings for reading the tiles.
    pub fn loader(&self) -> &LoaderConfig {
        &self.loader
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn apply_softmax(&self) -> bool {
        self.apply_softmax
    }
}

/// Batches each worker may queue: enough for two full batches in flight
/// across the pool, and never fewer than 2.
pub fn prefetch_depth(batch_size: usize, num_workers: usize) -> usize {
    if num_workers == 0 {
        return 2;
    }
    (batch_size * 2).div_ceil(num_workers).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn model(patch: u32, spacing: f64) -> ModelConfiguration {
        ModelConfiguration {
            spec_version: "1.0".to_string(),
            architecture: "resnet34".to_string(),
            num_classes: 2,
            class_names: vec!["Tumor".to_string(), "Other".to_string()],
            patch_size_pixels: patch,
            spacing_um_px: spacing,
            apply_softmax: true,
            transform: Vec::new(),
        }
    }

    #[test]
    fn test_prefetch_depth() {
        assert_eq!(prefetch_depth(1, 4), 2);
        assert_eq!(prefetch_depth(8, 3), 6);
        assert_eq!(prefetch_depth(16, 4), 8);
        assert_eq!(prefetch_depth(3, 2), 3);
    }

    #[test]
    fn test_plan_with_calibration() {
        // 350 px at 0.5 µm/px on a 0.25 µm/px image
        let calibration = PixelCalibration::square(0.25).unwrap();
        let plan = InferencePlan::new(&model(350, 0.5), Some(calibration), 8, 4).unwrap();

        assert_eq!(plan.loader().downsample(), 2.0);
        assert_eq!(plan.loader().tile_width(), 700);
        assert_eq!(plan.tile_spec().tile_width(), 700);
        assert_eq!(plan.tile_spec().tile_height(), 700);
        assert_eq!(plan.loader().num_prefetch(), 4);
        assert_eq!(plan.loader().resize(), None);
        assert_eq!(plan.tile_spec().policy(), TilingPolicy::default());
    }

    #[test]
    fn test_plan_with_rectangular_pixels() {
        let calibration = PixelCalibration::new(0.5, 0.25).unwrap();
        let plan = InferencePlan::new(&model(100, 0.5), Some(calibration), 1, 1).unwrap();

        assert_eq!(plan.tile_spec().tile_width(), 100);
        assert_eq!(plan.tile_spec().tile_height(), 200);
    }

    #[test]
    fn test_plan_without_calibration() {
        let plan = InferencePlan::new(&model(224, 0.5), None, 1, 4).unwrap();

        assert_eq!(plan.loader().downsample(), 1.0);
        assert_eq!(plan.loader().tile_width(), 224);
        assert_eq!(plan.tile_spec().tile_width(), 224);
        assert_eq!(plan.loader().num_prefetch(), 2);
        assert_eq!(plan.class_names(), &["Tumor".to_string(), "Other".to_string()]);
    }

    #[test]
    fn test_plan_uses_resize_transform() {
        let mut model = model(350, 0.5);
        model.transform = vec![crate::model::TransformConfig {
            name: "Resize".to_string(),
            arguments: serde_json::json!({ "size": 224 })
                .as_object()
                .cloned()
                .unwrap(),
        }];

        let plan = InferencePlan::new(&model, None, 1, 1).unwrap();
        assert_eq!(plan.loader().resize(), Some((224, 224)));
    }

    #[test]
    fn test_plan_rejects_zero_workers() {
        let result = InferencePlan::new(&model(224, 0.5), None, 1, 0);
        assert!(matches!(result, Err(ModelConfigError::Loader(_))));
    }

    #[test]
    fn test_plan_honours_pipeline_settings() {
        let pipeline = PipelineSettings {
            batch_size: 8,
            num_workers: 4,
            num_prefetch: Some(7),
            shutdown_ceiling: Duration::from_secs(3),
        };
        let plan = InferencePlan::with_pipeline(&model(224, 0.5), None, &pipeline).unwrap();

        assert_eq!(plan.loader().batch_size(), 8);
        assert_eq!(plan.loader().num_workers(), 4);
        assert_eq!(plan.loader().num_prefetch(), 7);
        assert_eq!(plan.loader().queue_capacity(), 28);
        assert_eq!(plan.loader().shutdown_ceiling(), Duration::from_secs(3));

        // Unset prefetch falls back to the derived depth
        let auto = PipelineSettings {
            num_prefetch: None,
            ..pipeline
        };
        let plan = InferencePlan::with_pipeline(&model(224, 0.5), None, &auto).unwrap();
        assert_eq!(plan.loader().num_prefetch(), prefetch_depth(8, 4));
    }

    #[test]
    fn test_invalid_calibration() {
        assert!(PixelCalibration::new(0.0, 0.25).is_err());
        assert!(PixelCalibration::square(f64::INFINITY).is_err());
    }
}
