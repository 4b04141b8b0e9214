//! Import run results and per-row errors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::taxon::TaxonId;
use crate::error::ErrorSeverity;

/// A row that did not produce a taxon id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub row_id: String,
    /// Error code (e.g., "INVALID_NAME", "LOW_CONFIDENCE")
    pub error_code: String,
    pub error_message: String,
    pub severity: ErrorSeverity,
    pub occurred_at: DateTime<Utc>,
}

impl RowError {
    pub fn new(
        row_id: impl Into<String>,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            error_code: error_code.into(),
            error_message: error_message.into(),
            severity: ErrorSeverity::Row,
            occurred_at: Utc::now(),
        }
    }
}

/// A row resolved to a taxon node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRow {
    pub row_id: String,
    pub full_name: String,
    pub taxon_id: TaxonId,
}

/// Run-end summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_token: String,
    pub rows_total: usize,
    /// Rows resolved to a taxon id (existing or created)
    pub rows_resolved: usize,
    /// Rows skipped due to input or ancestry errors
    pub rows_skipped: usize,
    /// Rows diverted to the review ledger
    pub rows_rejected: usize,
    pub nodes_created: usize,
    pub resolved: Vec<ResolvedRow>,
    pub errors: Vec<RowError>,
    pub duration_ms: u64,
}

impl ImportSummary {
    pub fn new(batch_token: impl Into<String>) -> Self {
        Self {
            batch_token: batch_token.into(),
            ..Default::default()
        }
    }

    /// Taxon id resolved for a row, if any
    pub fn taxon_for(&self, row_id: &str) -> Option<TaxonId> {
        self.resolved
            .iter()
            .find(|r| r.row_id == row_id)
            .map(|r| r.taxon_id)
    }

    /// Count errors with a given code
    pub fn count_by_code(&self, code: &str) -> usize {
        self.errors.iter().filter(|e| e.error_code == code).count()
    }
}
