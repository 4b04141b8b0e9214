//! Error types for herb-taxa
//!
//! Failures are classified by how far they propagate: row errors skip one
//! row, batch errors abort the current import batch, process errors abort
//! the run.

use crate::names::NameError;
use crate::services::resolution_client::ResolverError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How far an error propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorSeverity {
    /// Row is skipped and reported, the batch continues
    Row,
    /// The enclosing batch operation fails as a whole
    Batch,
    /// Internal consistency bug, the run aborts
    Process,
}

/// Taxon engine error type
#[derive(Debug, Error)]
pub enum TaxaError {
    /// No identifiable name could be built from the row
    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// A required root-level ancestor is absent and will not be invented
    #[error("Family missing for '{name}': {detail}")]
    MissingFamily { name: String, detail: String },

    /// External name resolution failed after exhausting retries
    #[error("External resolution service error: {0}")]
    ExternalService(#[from] ResolverError),

    /// Attempted insert with an unresolved parent
    #[error("Tree integrity violation: {0}")]
    TreeIntegrity(String),

    /// Undo requested for a token not in the provenance ledger
    #[error("Batch unknown: {0}")]
    BatchUnknown(String),

    /// herb-common error (database, configuration, I/O)
    #[error(transparent)]
    Common(#[from] herb_common::Error),
}

impl TaxaError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TaxaError::InvalidName(_) | TaxaError::MissingFamily { .. } => ErrorSeverity::Row,
            TaxaError::ExternalService(_) | TaxaError::BatchUnknown(_) | TaxaError::Common(_) => {
                ErrorSeverity::Batch
            }
            TaxaError::TreeIntegrity(_) => ErrorSeverity::Process,
        }
    }

    /// Short machine-readable code for summaries and logs
    pub fn code(&self) -> &'static str {
        match self {
            TaxaError::InvalidName(_) => "INVALID_NAME",
            TaxaError::MissingFamily { .. } => "MISSING_FAMILY",
            TaxaError::ExternalService(_) => "EXTERNAL_SERVICE",
            TaxaError::TreeIntegrity(_) => "TREE_INTEGRITY",
            TaxaError::BatchUnknown(_) => "BATCH_UNKNOWN",
            TaxaError::Common(_) => "STORE_ERROR",
        }
    }
}

impl From<sqlx::Error> for TaxaError {
    fn from(err: sqlx::Error) -> Self {
        TaxaError::Common(herb_common::Error::Database(err))
    }
}

/// Result type for taxon engine operations
pub type TaxaResult<T> = Result<T, TaxaError>;
