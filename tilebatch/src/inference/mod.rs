//! Inference consumer loop.
//!
//! The [`InferenceRunner`] is the single consumer of the loader's batch
//! queue. It counts sentinel batches explicitly rather than relying on the
//! queue going quiet, since batches and sentinels from different workers
//! interleave in any order.
//!
//! # Outcomes
//!
//! | Situation                          | Result                          |
//! |------------------------------------|---------------------------------|
//! | all sentinels received             | `Ok(RunOutcome::Completed)`     |
//! | cancellation observed              | `Ok(RunOutcome::Cancelled)`     |
//! | engine error or result mismatch    | `Err(InferenceError::...)`      |
//! | queue closed before all sentinels  | `Err(InferenceError::WorkersLost)` |
//!
//! Tiles whose pixel read failed are dropped by the loader and simply have
//! no classification; [`RunSummary::dropped`] counts them.

mod engine;
mod error;
mod outcome;
mod runner;

pub use engine::{EngineError, InferenceEngine};
pub use error::InferenceError;
pub use outcome::{RunOutcome, RunSummary};
pub use runner::{InferenceRunner, FAILED_MESSAGE, INTERRUPTED_MESSAGE};
