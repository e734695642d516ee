//! Consumer loop driving the engine from the loader's batch queue.

use std::sync::Arc;

use image::DynamicImage;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{EngineError, InferenceEngine, InferenceError, RunOutcome, RunSummary};
use crate::loader::{LoaderConfig, TileBatch, TileLoader};
use crate::progress::{ProgressListener, ProgressTracker};
use crate::region::RegionSource;
use crate::tile::{ClassificationResult, TileDescriptor};

/// Terminal progress message for a cancelled run.
pub const INTERRUPTED_MESSAGE: &str = "Inference interrupted!";

/// Terminal progress message for a failed run.
pub const FAILED_MESSAGE: &str = "Inference failed!";

/// Why the consumer loop stopped.
enum Stop {
    Drained,
    Cancelled,
}

/// Runs an [`InferenceEngine`] over a set of tiles.
///
/// The runner owns the consumer side of the pipeline: it starts a
/// [`TileLoader`], drains batches until every worker has sent its sentinel,
/// calls the engine once per batch and writes results back onto the tile
/// descriptors.
pub struct InferenceRunner<E> {
    engine: E,
    progress: Arc<dyn ProgressListener>,
}

impl<E: InferenceEngine> InferenceRunner<E> {
    pub fn new(engine: E, progress: Arc<dyn ProgressListener>) -> Self {
        Self { engine, progress }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Classifies `tiles`.
    ///
    /// Returns [`RunOutcome::Cancelled`] if `cancel` fires before all
    /// workers finish. Engine failures and lost workers are fatal.
    ///
    /// The engine is synchronous. On a multi-thread runtime each
    /// `batch_predict` call runs under [`tokio::task::block_in_place`] so
    /// other tasks keep running; on a current-thread runtime (as used by
    /// [`InferenceRunner::run_blocking`]) it runs inline and nothing else on
    /// that runtime makes progress until the call returns.
    pub async fn run(
        &mut self,
        tiles: Vec<Arc<TileDescriptor>>,
        source: Arc<dyn RegionSource>,
        config: &LoaderConfig,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, InferenceError> {
        let tracker = ProgressTracker::new(tiles.len());

        if tiles.is_empty() {
            warn!("No tiles to process!");
            return Ok(RunOutcome::Completed(summary(&tracker, 0)));
        }

        let mut loader = TileLoader::start(tiles, source, config, cancel)?;
        let mut batches = 0;
        self.progress.report(Some(&tracker.progress_message()), Some(0.0));

        let result = self
            .consume(&mut loader, &tracker, &mut batches, cancel)
            .await;

        let reports = loader.shutdown(config.shutdown_ceiling()).await;
        let read_failures: usize = reports.iter().map(|r| r.read_failures).sum();
        let summary = summary(&tracker, batches);

        match result {
            Ok(Stop::Drained) => {
                self.progress
                    .report(Some(&tracker.completion_message()), Some(1.0));
                info!(
                    total = summary.total,
                    processed = summary.processed,
                    dropped = summary.dropped(),
                    read_failures,
                    batches = summary.batches,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "Inference completed"
                );
                Ok(RunOutcome::Completed(summary))
            }
            Ok(Stop::Cancelled) => {
                self.progress.report(Some(INTERRUPTED_MESSAGE), Some(1.0));
                warn!(
                    processed = summary.processed,
                    total = summary.total,
                    "Inference cancelled"
                );
                Ok(RunOutcome::Cancelled(summary))
            }
            Err(e) => {
                self.progress.report(Some(FAILED_MESSAGE), Some(1.0));
                error!(
                    processed = summary.processed,
                    total = summary.total,
                    error = %e,
                    "Inference failed"
                );
                Err(e)
            }
        }
    }

    /// Blocking wrapper around [`InferenceRunner::run`] on a current-thread
    /// runtime.
    pub fn run_blocking(
        &mut self,
        tiles: Vec<Arc<TileDescriptor>>,
        source: Arc<dyn RegionSource>,
        config: &LoaderConfig,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, InferenceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(InferenceError::Runtime)?;

        runtime.block_on(self.run(tiles, source, config, cancel))
    }

    async fn consume(
        &mut self,
        loader: &mut TileLoader,
        tracker: &ProgressTracker,
        batches: &mut usize,
        cancel: &CancellationToken,
    ) -> Result<Stop, InferenceError> {
        let expected = loader.num_workers();
        let mut sentinels = 0;

        while sentinels < expected {
            let next = tokio::select! {
                biased;

                _ = cancel.cancelled() => return Ok(Stop::Cancelled),

                next = loader.next_batch() => next,
            };

            let Some(batch) = next else {
                return Err(InferenceError::WorkersLost {
                    expected,
                    received: sentinels,
                });
            };

            if batch.is_sentinel() {
                sentinels += 1;
                debug!(
                    worker = batch.worker(),
                    sentinels, expected, "Loader worker finished"
                );
                continue;
            }

            if batch.is_empty() {
                continue;
            }

            let classified = self.process_batch(batch)?;
            tracker.record(classified);
            *batches += 1;

            self.progress
                .report(Some(&tracker.progress_message()), Some(tracker.fraction()));
        }

        Ok(Stop::Drained)
    }

    fn process_batch(&mut self, batch: TileBatch) -> Result<usize, InferenceError> {
        let worker = batch.worker();
        let (images, descriptors) = batch.into_parts();

        let results = predict(&mut self.engine, &images)?;
        if results.len() != descriptors.len() {
            return Err(InferenceError::ResultCountMismatch {
                expected: descriptors.len(),
                actual: results.len(),
            });
        }

        for (descriptor, result) in descriptors.iter().zip(results) {
            descriptor.attach_classification(result)?;
        }

        debug!(worker, size = descriptors.len(), "Classified batch");
        Ok(descriptors.len())
    }
}

/// Calls the engine, stepping off the async worker when the runtime allows it.
fn predict<E: InferenceEngine>(
    engine: &mut E,
    images: &[DynamicImage],
) -> Result<Vec<ClassificationResult>, EngineError> {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(|| engine.batch_predict(images))
        }
        _ => engine.batch_predict(images),
    }
}

fn summary(tracker: &ProgressTracker, batches: usize) -> RunSummary {
    RunSummary {
        total: tracker.total(),
        processed: tracker.processed(),
        batches,
        elapsed: tracker.elapsed(),
    }
}
