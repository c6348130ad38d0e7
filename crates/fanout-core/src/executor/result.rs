//! Per-operation and batch result types.

use crate::retry::ApiError;

/// Outcome of one operation, tagged with its position in the submitted batch.
///
/// A two-variant enum so "never both, never neither" holds by construction:
/// a value and an error cannot coexist.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult<T> {
    Success { value: T, index: usize },
    Failure { error: ApiError, index: usize },
}

impl<T> OperationResult<T> {
    /// Position of this operation in the input list, independent of
    /// completion order.
    pub fn index(&self) -> usize {
        match self {
            OperationResult::Success { index, .. } => *index,
            OperationResult::Failure { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success { .. })
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            OperationResult::Failure { error, .. } => Some(error),
            OperationResult::Success { .. } => None,
        }
    }
}

/// Aggregate outcome of one batch run.
///
/// `results[i]` always corresponds to the i-th submitted operation, and
/// `results.len() == total_count == success_count + error_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<T> {
    pub results: Vec<OperationResult<T>>,
    pub success_count: usize,
    pub error_count: usize,
    pub total_count: usize,
}

impl<T> BatchResult<T> {
    /// Result of a batch with no operations.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            success_count: 0,
            error_count: 0,
            total_count: 0,
        }
    }
}

/// True when every operation in the batch succeeded.
pub fn all_succeeded<T>(batch: &BatchResult<T>) -> bool {
    batch.error_count == 0
}

/// Successful values in input order.
pub fn successes<T>(batch: &BatchResult<T>) -> Vec<&T> {
    batch
        .results
        .iter()
        .filter_map(|r| match r {
            OperationResult::Success { value, .. } => Some(value),
            OperationResult::Failure { .. } => None,
        })
        .collect()
}

/// Failed operations as `(index, error)` pairs in input order.
pub fn failures<T>(batch: &BatchResult<T>) -> Vec<(usize, &ApiError)> {
    batch
        .results
        .iter()
        .filter_map(|r| match r {
            OperationResult::Failure { error, index } => Some((*index, error)),
            OperationResult::Success { .. } => None,
        })
        .collect()
}
