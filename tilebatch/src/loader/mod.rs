//! Concurrent tile loading and batching.
//!
//! A fixed pool of worker threads drains a shared [`IntakeQueue`], reads the
//! pixels for each claimed tile and pushes [`TileBatch`]es onto a bounded
//! output queue. The queue is the only backpressure: once it holds
//! `num_workers × num_prefetch` batches, workers block until the consumer
//! catches up.
//!
//! ```text
//!                    ┌─────────────┐
//!                    │ IntakeQueue │  claim(batch_size)
//!                    └──────┬──────┘
//!            ┌──────────────┼──────────────┐
//!            ▼              ▼              ▼
//!      tile-loader-0  tile-loader-1  tile-loader-N
//!            │              │              │   blocking_send
//!            └──────────────┼──────────────┘
//!                           ▼
//!              bounded mpsc (capacity C) ──► next_batch().await
//! ```
//!
//! # Termination
//!
//! Each worker pushes exactly one sentinel batch once the intake is empty,
//! so a consumer that has seen `num_workers` sentinels knows every tile was
//! either delivered or dropped. A cancelled worker pushes nothing.

mod batch;
mod config;
mod error;
mod intake;
mod worker;

pub use batch::{TileBatch, TileInput};
pub use config::{
    LoaderConfig, LoaderConfigBuilder, DEFAULT_BATCH_SIZE, DEFAULT_NUM_PREFETCH,
    DEFAULT_NUM_WORKERS, DEFAULT_SHUTDOWN_CEILING, DEFAULT_TILE_SIZE,
};
pub use error::{LoaderConfigError, LoaderError};
pub use intake::IntakeQueue;
pub use worker::WorkerReport;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::region::RegionSource;
use crate::tile::TileDescriptor;
use worker::Worker;

/// How often shutdown checks whether workers have exited.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Running loader: worker threads plus the receiving end of the batch queue.
///
/// Dropping the loader cancels its workers; use [`TileLoader::shutdown`] to
/// also wait for them and collect their reports.
pub struct TileLoader {
    receiver: mpsc::Receiver<TileBatch>,
    workers: Vec<JoinHandle<WorkerReport>>,
    intake: Arc<IntakeQueue>,
    num_workers: usize,
    capacity: usize,
    cancel: CancellationToken,
}

impl TileLoader {
    /// Fills the intake queue and starts the worker threads.
    ///
    /// Workers stop early when `cancel` (or the loader's own child token)
    /// is cancelled.
    pub fn start(
        descriptors: Vec<Arc<TileDescriptor>>,
        source: Arc<dyn RegionSource>,
        config: &LoaderConfig,
        cancel: &CancellationToken,
    ) -> Result<Self, LoaderError> {
        let intake = Arc::new(IntakeQueue::new(descriptors));
        let capacity = config.queue_capacity();
        let (sender, receiver) = mpsc::channel(capacity);
        let cancel = cancel.child_token();
        let reader = config.reader();

        let mut workers = Vec::with_capacity(config.num_workers());
        for index in 0..config.num_workers() {
            let worker = Worker {
                index,
                intake: Arc::clone(&intake),
                source: Arc::clone(&source),
                reader,
                batch_size: config.batch_size(),
                sender: sender.clone(),
                cancel: cancel.clone(),
            };

            let spawned = thread::Builder::new()
                .name(format!("tile-loader-{}", index))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    cancel.cancel();
                    return Err(LoaderError::Spawn {
                        worker: index,
                        source: e,
                    });
                }
            }
        }

        info!(
            tiles = intake.total(),
            workers = config.num_workers(),
            batch_size = config.batch_size(),
            queue_capacity = capacity,
            "Tile loader started"
        );

        Ok(Self {
            receiver,
            workers,
            intake,
            num_workers: config.num_workers(),
            capacity,
            cancel,
        })
    }

    /// Number of workers requested, and so the number of sentinels to expect.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Output queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.capacity
    }

    /// Batches currently waiting in the output queue.
    pub fn queued_batches(&self) -> usize {
        self.receiver.len()
    }

    /// Tiles not yet claimed by any worker.
    pub fn remaining_tiles(&self) -> usize {
        self.intake.remaining()
    }

    /// Total tiles handed to the loader.
    pub fn total_tiles(&self) -> usize {
        self.intake.total()
    }

    /// Waits for the next batch.
    ///
    /// Returns `None` once every worker has exited and the queue is empty.
    pub async fn next_batch(&mut self) -> Option<TileBatch> {
        self.receiver.recv().await
    }

    /// Stops the workers and waits up to `ceiling` for them to exit.
    ///
    /// The queue is closed first so workers blocked on a full queue wake up.
    /// Workers still running at the deadline are detached.
    pub async fn shutdown(mut self, ceiling: Duration) -> Vec<WorkerReport> {
        self.cancel.cancel();
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}

        let deadline = Instant::now() + ceiling;
        let mut pending = std::mem::take(&mut self.workers);
        let mut reports = Vec::with_capacity(pending.len());

        loop {
            let (finished, running): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(|handle| handle.is_finished());

            for handle in finished {
                match handle.join() {
                    Ok(report) => reports.push(report),
                    Err(_) => warn!("Loader worker panicked"),
                }
            }

            pending = running;
            if pending.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    stragglers = pending.len(),
                    ceiling_ms = ceiling.as_millis() as u64,
                    "Loader workers did not stop before shutdown ceiling, detaching"
                );
                break;
            }
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }

        reports.sort_by_key(|report| report.worker);
        for report in &reports {
            debug!(
                worker = report.worker,
                batches = report.batches,
                tiles_read = report.tiles_read,
                read_failures = report.read_failures,
                cancelled = report.cancelled,
                "Loader worker report"
            );
        }

        reports
    }
}

impl Drop for TileLoader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for TileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("num_workers", &self.num_workers)
            .field("capacity", &self.capacity)
            .field("queued", &self.receiver.len())
            .field("remaining", &self.intake.remaining())
            .finish()
    }
}
