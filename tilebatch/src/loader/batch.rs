//! Batches passed from loader workers to the consumer.

use std::fmt;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

use crate::tile::TileDescriptor;

/// One successfully read tile.
pub struct TileInput {
    pub image: DynamicImage,
    pub descriptor: Arc<TileDescriptor>,
}

impl fmt::Debug for TileInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileInput")
            .field("tile", &self.descriptor.id())
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

/// A group of tiles read by one worker.
///
/// Completion is signalled by an explicit sentinel batch rather than by an
/// empty tile list. A sentinel never carries tiles.
#[derive(Debug)]
pub struct TileBatch {
    worker: usize,
    inputs: Vec<TileInput>,
    sentinel: bool,
}

impl TileBatch {
    /// Creates a batch of read tiles.
    pub fn new(worker: usize, inputs: Vec<TileInput>) -> Self {
        Self {
            worker,
            inputs,
            sentinel: false,
        }
    }

    /// Creates the completion marker for `worker`.
    pub fn sentinel(worker: usize) -> Self {
        Self {
            worker,
            inputs: Vec::new(),
            sentinel: true,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.sentinel
    }

    /// Index of the worker that produced this batch.
    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Splits the batch into positionally aligned images and descriptors.
    pub fn into_parts(self) -> (Vec<DynamicImage>, Vec<Arc<TileDescriptor>>) {
        self.inputs
            .into_iter()
            .map(|input| (input.image, input.descriptor))
            .unzip()
    }
}
