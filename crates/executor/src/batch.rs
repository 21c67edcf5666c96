//! Batch report types for `Executor::batch_operations`.

use serde::{Deserialize, Serialize};

use crate::{Error, Output};

/// Outcome of one operation in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Ran and returned an output
    Succeeded,
    /// Ran and returned an error
    Failed,
    /// Not run: fail-fast stopped the batch before it started
    Skipped,
}

/// One entry of a [`BatchReport`], in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Position in the input list
    pub position: usize,
    /// Operation name
    pub op: String,
    /// Outcome
    pub status: BatchStatus,
    /// Output when succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
    /// Error when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl BatchItem {
    pub(crate) fn new(position: usize, op: &str) -> Self {
        BatchItem {
            position,
            op: op.to_string(),
            status: BatchStatus::Skipped,
            output: None,
            error: None,
        }
    }

    pub(crate) fn set_result(&mut self, result: crate::Result<Output>) {
        match result {
            Ok(output) => {
                self.status = BatchStatus::Succeeded;
                self.output = Some(output);
            }
            Err(error) => {
                self.status = BatchStatus::Failed;
                self.error = Some(error);
            }
        }
    }
}

/// Result of `batch_operations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One item per input operation, in input order
    pub items: Vec<BatchItem>,
    /// Operations that succeeded
    pub succeeded: usize,
    /// Operations that failed
    pub failed: usize,
    /// Operations not run
    pub skipped: usize,
    /// Whether operations ran concurrently
    pub parallel: bool,
    /// Whether the first failure stopped the batch
    pub fail_fast: bool,
    /// Wall-clock duration in microseconds
    pub duration_us: u64,
}

impl BatchReport {
    pub(crate) fn from_items(
        items: Vec<BatchItem>,
        parallel: bool,
        fail_fast: bool,
        duration_us: u64,
    ) -> Self {
        let count = |s: BatchStatus| items.iter().filter(|i| i.status == s).count();
        BatchReport {
            succeeded: count(BatchStatus::Succeeded),
            failed: count(BatchStatus::Failed),
            skipped: count(BatchStatus::Skipped),
            items,
            parallel,
            fail_fast,
            duration_us,
        }
    }

    /// First failure in input order
    pub fn first_error(&self) -> Option<&Error> {
        self.items.iter().find_map(|i| i.error.as_ref())
    }

    /// True if every operation succeeded
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.items.len()
    }
}
