//! Transfer Reports
//!
//! Structured outcome types for a pass. Counts are the contract; rendering
//! them for a user is the presentation layer's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one reconciliation-and-transfer pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(Uuid);

impl PassId {
    /// Create a new random pass ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a pass ID from a string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One item that failed, with its filename for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub filename: String,
    pub message: String,
}

/// Outcome of executing a work list.
///
/// Per-item transfers always satisfy
/// `succeeded + duplicates + failed == transfer_total` regardless of which
/// items failed or in what order they ran. Deletion accounting is separate
/// because deletions execute as one batch, not per item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Per-item work items (uploads + downloads) in the list
    pub transfer_total: u64,

    /// Items transferred successfully
    pub succeeded: u64,

    /// Uploads the server acknowledged as content-level duplicates
    pub duplicates: u64,

    /// Items that failed and were skipped
    pub failed: u64,

    /// Failures with filenames, in execution order
    pub failures: Vec<ItemFailure>,

    /// Deletion candidates handed to the batch
    pub delete_attempted: u64,

    /// Assets deleted by the batch call
    pub deleted: u64,

    /// Deletion candidates excluded for lacking a resolvable locator
    pub delete_unresolvable: u64,

    /// Error message when the whole deletion batch failed
    pub delete_batch_error: Option<String>,

    /// Wall-clock duration of the run in seconds
    pub duration_secs: u64,
}

impl TransferReport {
    /// Invariant check: every per-item transfer is accounted exactly once
    pub fn accounting_closes(&self) -> bool {
        self.succeeded + self.duplicates + self.failed == self.transfer_total
    }

    /// Up to `limit` example failures for human-readable summaries
    pub fn example_failures(&self, limit: usize) -> &[ItemFailure] {
        &self.failures[..self.failures.len().min(limit)]
    }
}
