//! Batch provenance and undo reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance ledger entry for one import run
///
/// `start_time` and `end_time` are stored already padded by the configured
/// window buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub token: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub creator_id: i64,
    /// Number of taxon nodes the batch created
    pub size: i64,
}

/// Result of undoing a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UndoReport {
    pub token: String,
    /// Nodes deleted in each pruning pass, finest level first
    pub deleted_per_pass: Vec<u64>,
    pub total_deleted: u64,
    /// Review ledger entries cleared with the batch
    pub review_entries_cleared: u64,
}
