//! Concurrency-limited batch executor.
//!
//! Runs independent operations with a bounded number in flight, collects a
//! discriminated per-item result, and never lets one failure abort a batch.

mod parallel;
mod result;

pub use parallel::{ExecutorConfig, ExecutorError, ParallelExecutor};
pub use result::{all_succeeded, failures, successes, BatchResult, OperationResult};
