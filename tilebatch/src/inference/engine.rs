//! Inference engine abstraction.

use image::DynamicImage;
use thiserror::Error;

use crate::tile::ClassificationResult;

/// Errors raised by an inference engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

/// Batched image classifier.
///
/// Called once per non-empty batch with every image in the batch. Results
/// must be positionally aligned with `images`.
pub trait InferenceEngine {
    fn batch_predict(
        &mut self,
        images: &[DynamicImage],
    ) -> Result<Vec<ClassificationResult>, EngineError>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn batch_predict(
        &mut self,
        images: &[DynamicImage],
    ) -> Result<Vec<ClassificationResult>, EngineError> {
        (**self).batch_predict(images)
    }
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for &mut E {
    fn batch_predict(
        &mut self,
        images: &[DynamicImage],
    ) -> Result<Vec<ClassificationResult>, EngineError> {
        (**self).batch_predict(images)
    }
}
