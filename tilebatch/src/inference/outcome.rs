use std::time::Duration;

/// Counts for a finished or cancelled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Tiles handed to the run.
    pub total: usize,
    /// Tiles that received a classification.
    pub processed: usize,
    /// Non-empty batches submitted to the engine.
    pub batches: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Tiles that never received a classification.
    pub fn dropped(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every sentinel arrived; all readable tiles were classified.
    Completed(RunSummary),
    /// Cancellation was observed before the run finished.
    Cancelled(RunSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::Completed(summary) | RunOutcome::Cancelled(summary) => summary,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled(_))
    }
}
