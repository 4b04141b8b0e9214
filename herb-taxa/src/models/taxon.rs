//! Persisted taxon tree nodes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::names::Rank;

/// Surrogate key of a taxon node
pub type TaxonId = i64;

/// Taxon tree node as stored in the `taxa` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonNode {
    pub id: TaxonId,
    /// Complete scientific name including all ranks above the node
    pub full_name: String,
    /// The node's own epithet
    pub terminal_name: String,
    pub rank_id: i64,
    pub tree_definition_item_id: i64,
    /// None only for root (family level) nodes
    pub parent_id: Option<TaxonId>,
    pub author: Option<String>,
    pub is_hybrid: bool,
    pub is_accepted: bool,
    pub guid: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
}

/// Node about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaxon {
    pub full_name: String,
    pub terminal_name: String,
    pub rank: Rank,
    pub parent_id: Option<TaxonId>,
    pub author: Option<String>,
    pub is_hybrid: bool,
    pub created_by: i64,
}
