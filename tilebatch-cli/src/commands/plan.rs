//! `tilebatch plan` - derive tiling and loader settings for a model.

use std::path::PathBuf;

use clap::Args;
use tilebatch::config::PipelineSettings;
use tilebatch::model::{InferencePlan, ModelConfiguration, PixelCalibration};

use crate::error::CliError;

/// Arguments for the plan command.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Model configuration JSON
    #[arg(long)]
    pub model: PathBuf,

    /// Image pixel size in µm (omit if the image is uncalibrated)
    #[arg(long)]
    pub pixel_size: Option<f64>,

    /// Tiles per inference batch (default from config)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Loader worker threads (default from config)
    #[arg(long)]
    pub workers: Option<usize>,
}

impl PlanArgs {
    /// Overlays command-line sizes on the configured pipeline settings.
    ///
    /// An explicit `num_prefetch` from the config is kept; otherwise it is
    /// derived from the effective batch size and worker count.
    pub fn pipeline(&self, base: &PipelineSettings) -> PipelineSettings {
        PipelineSettings {
            batch_size: self.batch_size.unwrap_or(base.batch_size),
            num_workers: self.workers.unwrap_or(base.num_workers),
            ..base.clone()
        }
    }
}

/// Run the plan command.
pub fn run(args: &PlanArgs, pipeline: &PipelineSettings) -> Result<(), CliError> {
    let model = ModelConfiguration::load(&args.model)?;
    let calibration = args.pixel_size.map(PixelCalibration::square).transpose()?;
    let plan = InferencePlan::with_pipeline(&model, calibration, &args.pipeline(pipeline))?;

    for line in describe(&model, &plan) {
        println!("{}", line);
    }
    Ok(())
}

fn describe(model: &ModelConfiguration, plan: &InferencePlan) -> Vec<String> {
    let spec = plan.tile_spec();
    let loader = plan.loader();
    let resize = loader
        .resize()
        .map(|(w, h)| format!("{}×{}", w, h))
        .unwrap_or_else(|| "none".to_string());

    vec![
        format!("Model:         {} ({} classes)", model.architecture, model.num_classes),
        format!("Classes:       {}", plan.class_names().join(", ")),
        format!("Softmax:       {}", plan.apply_softmax()),
        format!(
            "Tile grid:     {}×{} px (symmetric={}, trim={}, centroid filter={})",
            spec.tile_width(),
            spec.tile_height(),
            spec.policy().symmetric,
            spec.policy().trim_to_parent,
            spec.policy().filter_by_centroid
        ),
        format!(
            "Read region:   {}×{} px at downsample {:.3}",
            loader.tile_width(),
            loader.tile_height(),
            loader.downsample()
        ),
        format!("Resize:        {}", resize),
        format!(
            "Pipeline:      batch {} / {} workers / prefetch {} (queue capacity {})",
            loader.batch_size(),
            loader.num_workers(),
            loader.num_prefetch(),
            loader.queue_capacity()
        ),
        format!("Shutdown:      {} s", loader.shutdown_ceiling().as_secs()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_plan() {
        let model = ModelConfiguration::from_json(
            r#"{
                "spec_version": "1.0",
                "architecture": "resnet34",
                "num_classes": 2,
                "class_names": ["Tumor", "Other"],
                "patch_size_pixels": 350,
                "spacing_um_px": 0.5,
                "transform": [{ "name": "Resize", "arguments": { "size": 224 } }]
            }"#,
        )
        .unwrap();
        let calibration = PixelCalibration::square(0.25).unwrap();
        let plan = InferencePlan::new(&model, Some(calibration), 8, 4).unwrap();

        let lines = describe(&model, &plan);
        assert!(lines[1].ends_with("Tumor, Other"));
        assert!(lines[3].contains("700×700 px"));
        assert!(lines[4].contains("downsample 2.000"));
        assert!(lines[5].ends_with("224×224"));
        assert!(lines[6].contains("queue capacity 16"));
    }

    #[test]
    fn test_config_prefetch_survives_overrides() {
        let args = PlanArgs {
            model: PathBuf::from("unused.json"),
            pixel_size: None,
            batch_size: Some(16),
            workers: None,
        };
        let base = PipelineSettings {
            num_prefetch: Some(3),
            shutdown_ceiling: std::time::Duration::from_secs(30),
            ..PipelineSettings::default()
        };

        let pipeline = args.pipeline(&base);
        assert_eq!(pipeline.batch_size, 16);
        assert_eq!(pipeline.num_workers, base.num_workers);
        assert_eq!(pipeline.effective_prefetch(), 3);
        assert_eq!(pipeline.shutdown_ceiling.as_secs(), 30);
    }
}
