//! Loader worker thread body.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{IntakeQueue, TileBatch, TileInput};
use crate::region::{RegionSource, TileReader};

/// What a worker did before exiting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker index.
    pub worker: usize,
    /// Non-sentinel batches pushed.
    pub batches: usize,
    /// Tiles read successfully and pushed.
    pub tiles_read: usize,
    /// Tiles dropped because their read failed.
    pub read_failures: usize,
    /// True if the worker stopped on cancellation or a closed queue.
    pub cancelled: bool,
}

pub(super) struct Worker {
    pub index: usize,
    pub intake: Arc<IntakeQueue>,
    pub source: Arc<dyn RegionSource>,
    pub reader: TileReader,
    pub batch_size: usize,
    pub sender: mpsc::Sender<TileBatch>,
    pub cancel: CancellationToken,
}

impl Worker {
    /// Claims, reads and pushes batches until the intake is drained, then
    /// pushes one sentinel.
    ///
    /// A cancelled worker abandons its partial batch and pushes nothing.
    pub fn run(self) -> WorkerReport {
        let mut report = WorkerReport {
            worker: self.index,
            ..Default::default()
        };

        debug!(worker = self.index, "Loader worker started");

        loop {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let claimed = self.intake.claim(self.batch_size);
            let mut inputs = Vec::with_capacity(claimed.len());

            for descriptor in claimed {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                match self.reader.read(self.source.as_ref(), &descriptor) {
                    Ok(image) => inputs.push(TileInput { image, descriptor }),
                    Err(e) => {
                        warn!(
                            worker = self.index,
                            tile = %descriptor.id(),
                            error = %e,
                            "Failed to read tile, dropping"
                        );
                        report.read_failures += 1;
                    }
                }
            }

            if report.cancelled || self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let batch = if !inputs.is_empty() {
                TileBatch::new(self.index, inputs)
            } else if self.intake.is_empty() {
                TileBatch::sentinel(self.index)
            } else {
                // Every read in this claim failed but tiles remain
                continue;
            };

            let is_sentinel = batch.is_sentinel();
            let size = batch.len();

            if self.sender.blocking_send(batch).is_err() {
                debug!(worker = self.index, "Output queue closed, stopping worker");
                report.cancelled = true;
                break;
            }

            if is_sentinel {
                break;
            }

            report.batches += 1;
            report.tiles_read += size;
            trace!(worker = self.index, size, "Pushed batch");
        }

        debug!(
            worker = self.index,
            batches = report.batches,
            tiles_read = report.tiles_read,
            read_failures = report.read_failures,
            cancelled = report.cancelled,
            "Loader worker finished"
        );

        report
    }
}
