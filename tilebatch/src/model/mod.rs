//! Model configuration and inference planning.
//!
//! A model is described by a JSON configuration declaring its classes, patch
//! size and the physical pixel spacing it was trained at. [`InferencePlan`]
//! turns that description plus the image's [`PixelCalibration`] into the
//! tiler and loader settings for a run.

mod configuration;
mod error;
mod plan;

pub use configuration::{ModelConfiguration, TransformConfig, RESIZE_TRANSFORM};
pub use error::ModelConfigError;
pub use plan::{prefetch_depth, InferencePlan, PixelCalibration};
