//! Run a batch of independent operations with a hard ceiling on in-flight
//! concurrency.
//!
//! Keeps up to `max_concurrent_requests` operations running at once; when
//! one settles, the next queued operation is admitted until the queue is
//! empty. Admission is greedy FIFO in input order. A slot is held for the
//! full lifetime of an operation, including any backoff sleeps inside it.

use std::future::Future;
use std::time::Instant;

use thiserror::Error;
use tokio::task::JoinSet;

use super::result::{BatchResult, OperationResult};
use crate::retry::ApiError;

/// Execution limits, fixed at construction and read-only afterwards.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Hard ceiling on operations per batch; larger batches are rejected
    /// before any work starts.
    pub max_batch_size: usize,
    /// Maximum operations in flight at any instant.
    pub max_concurrent_requests: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            max_concurrent_requests: 8,
        }
    }
}

/// Raised by the executor itself. Per-operation failures never surface
/// here; they are captured as `Failure` entries in the `BatchResult`.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Batch-size precondition violated; nothing was started. The caller is
    /// expected to split the batch.
    #[error("batch of {actual} operations exceeds the maximum of {limit}; split the batch")]
    BatchTooLarge { actual: usize, limit: usize },
    /// An operation panicked. Programmer error, not a remote failure.
    #[error("operation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Runs batches of operations under a fixed concurrency budget.
///
/// Owns no state across calls; each `execute_parallel` invocation has its
/// own scheduler and accumulator.
pub struct ParallelExecutor {
    cfg: ExecutorConfig,
}

impl ParallelExecutor {
    pub fn new(cfg: ExecutorConfig) -> Self {
        let cfg = ExecutorConfig {
            max_batch_size: cfg.max_batch_size,
            max_concurrent_requests: cfg.max_concurrent_requests.max(1),
        };
        Self { cfg }
    }

    pub fn config(&self) -> ExecutorConfig {
        self.cfg
    }

    /// Runs every operation to completion and reports one result per
    /// operation, index-correlated with the input, regardless of completion
    /// order. One failing operation never aborts the batch.
    pub async fn execute_parallel<T, F>(
        &self,
        operations: Vec<F>,
        label: &str,
    ) -> Result<BatchResult<T>, ExecutorError>
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
    {
        let total = operations.len();
        if total > self.cfg.max_batch_size {
            return Err(ExecutorError::BatchTooLarge {
                actual: total,
                limit: self.cfg.max_batch_size,
            });
        }

        tracing::debug!(
            label,
            total,
            max_concurrent = self.cfg.max_concurrent_requests,
            "starting batch"
        );
        let started = Instant::now();

        let mut queue = operations.into_iter().enumerate();
        let mut join_set = JoinSet::new();
        let mut settled: Vec<OperationResult<T>> = Vec::with_capacity(total);
        let mut success_count = 0usize;
        let mut error_count = 0usize;

        loop {
            while join_set.len() < self.cfg.max_concurrent_requests {
                let Some((index, op)) = queue.next() else {
                    break;
                };
                join_set.spawn(async move { (index, op.await) });
            }

            if join_set.is_empty() {
                break;
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            let (index, outcome) = joined?;
            match outcome {
                Ok(value) => {
                    success_count += 1;
                    settled.push(OperationResult::Success { value, index });
                }
                Err(error) => {
                    error_count += 1;
                    tracing::warn!(label, index, "operation failed: {}", error);
                    settled.push(OperationResult::Failure { error, index });
                }
            }
        }

        settled.sort_by_key(|r| r.index());
        tracing::info!(
            label,
            total,
            success_count,
            error_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch complete"
        );
        Ok(BatchResult {
            results: settled,
            success_count,
            error_count,
            total_count: total,
        })
    }
}
