//! Progress reporting for inference runs.
//!
//! The consumer loop reports coarse events through a [`ProgressListener`].
//! Either field of an event may be absent; an event with neither is ignored.
//! Listeners can be called from any thread, so they must be `Send + Sync`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

/// Sink for progress events.
pub trait ProgressListener: Send + Sync {
    /// Reports a message and/or a completion fraction in `0.0..=1.0`.
    fn report(&self, message: Option<&str>, fraction: Option<f64>);
}

impl<F> ProgressListener for F
where
    F: Fn(Option<&str>, Option<f64>) + Send + Sync,
{
    fn report(&self, message: Option<&str>, fraction: Option<f64>) {
        self(message, fraction)
    }
}

/// Logs progress through `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl TracingProgress {
    /// Formats an event, or `None` when both fields are absent.
    pub fn format(message: Option<&str>, fraction: Option<f64>) -> Option<String> {
        match (message, fraction) {
            (None, None) => None,
            (Some(message), None) => Some(message.to_string()),
            (None, Some(fraction)) => Some(format!("{}%", percent(fraction))),
            (Some(message), Some(fraction)) => {
                Some(format!("{}: {}%", message, percent(fraction)))
            }
        }
    }
}

impl ProgressListener for TracingProgress {
    fn report(&self, message: Option<&str>, fraction: Option<f64>) {
        if let Some(line) = Self::format(message, fraction) {
            info!(progress = fraction, "{}", line);
        }
    }
}

fn percent(fraction: f64) -> i64 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as i64
}

/// Discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressListener for NoopProgress {
    fn report(&self, _message: Option<&str>, _fraction: Option<f64>) {}
}

// =============================================================================
// Tracker
// =============================================================================

/// Cumulative tile counts for one run.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    processed: AtomicUsize,
    started: Instant,
}

impl ProgressTracker {
    /// Starts tracking a run of `total` tiles.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// Adds `count` processed tiles and returns the new cumulative count.
    pub fn record(&self, count: usize) -> usize {
        self.processed.fetch_add(count, Ordering::SeqCst) + count
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fraction of the total processed so far. An empty run counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.processed() as f64 / self.total as f64).min(1.0)
    }

    /// "Processed a/b tiles (r tiles/s)"
    pub fn progress_message(&self) -> String {
        format_counts("Processed", self.processed(), self.total, self.elapsed())
    }

    /// "Completed a/b tiles (r tiles/s)"
    pub fn completion_message(&self) -> String {
        format_counts("Completed", self.processed(), self.total, self.elapsed())
    }
}

fn format_counts(verb: &str, processed: usize, total: usize, elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    let rate = if seconds > 0.0 {
        processed as f64 / seconds
    } else {
        0.0
    };
    format!("{} {}/{} tiles ({:.1} tiles/s)", verb, processed, total, rate)
}
