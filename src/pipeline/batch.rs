//! Batch results.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file that failed during batch processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Input file
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Outcome of processing a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Inputs that produced all artifacts
    pub succeeded: Vec<PathBuf>,
    /// Inputs that failed, in processing order
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    /// Number of inputs seen.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every input succeeded (true for an empty batch).
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether at least one input failed.
    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty()
    }

    pub(crate) fn record_success(&mut self, path: &Path) {
        self.succeeded.push(path.to_path_buf());
    }

    pub(crate) fn record_failure(&mut self, path: &Path, error: impl ToString) {
        self.failed.push(BatchFailure {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }
}
