//! Raw name fields as transcribed from specimen labels

use serde::{Deserialize, Serialize};

/// One row of raw name fields supplied by the ingestion collaborator
///
/// Blank strings are treated the same as missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNameRow {
    /// Caller's identifier for the row (spreadsheet row, catalog number, ...)
    pub row_id: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    /// First infraspecific rank token (`subsp.`, `var.`, `f.`, ...)
    #[serde(default)]
    pub rank1: Option<String>,
    #[serde(default)]
    pub epithet1: Option<String>,
    /// Second infraspecific rank token, finer than `rank1`
    #[serde(default)]
    pub rank2: Option<String>,
    #[serde(default)]
    pub epithet2: Option<String>,
    #[serde(default)]
    pub hybrid: bool,
    /// Identification qualifier (`cf.`, `aff.`), or the hybrid formula when `hybrid` is set
    #[serde(default)]
    pub qualifier: Option<String>,
}

impl RawNameRow {
    pub fn new(row_id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            ..Default::default()
        }
    }
}
