//! Rank lexicon
//!
//! Fixed ordering of the ranks the engine works with, their persisted rank
//! ids and tree-definition item codes, and the label tokens that name them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Taxonomic rank, ordered coarse to fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Family,
    Genus,
    Species,
    Subspecies,
    Variety,
    Subvariety,
    Forma,
    Subforma,
}

impl Rank {
    /// Persisted ordinal rank id
    pub fn rank_id(self) -> i64 {
        match self {
            Rank::Family => 140,
            Rank::Genus => 180,
            Rank::Species => 220,
            Rank::Subspecies => 230,
            Rank::Variety => 240,
            Rank::Subvariety => 250,
            Rank::Forma => 260,
            Rank::Subforma => 270,
        }
    }

    /// Tree-definition item the rank is displayed under
    pub fn tree_definition_item_id(self) -> i64 {
        match self {
            Rank::Family => 11,
            Rank::Genus => 12,
            Rank::Species => 13,
            Rank::Subspecies => 14,
            Rank::Variety => 15,
            Rank::Subvariety => 16,
            Rank::Forma => 17,
            Rank::Subforma => 18,
        }
    }

    pub fn all() -> [Rank; 8] {
        [
            Rank::Family,
            Rank::Genus,
            Rank::Species,
            Rank::Subspecies,
            Rank::Variety,
            Rank::Subvariety,
            Rank::Forma,
            Rank::Subforma,
        ]
    }

    /// Parse an infraspecific rank token as written on labels
    ///
    /// Case-insensitive; the trailing period is optional. Only ranks below
    /// species have tokens.
    pub fn from_token(token: &str) -> Option<Rank> {
        let normalized = token.trim().trim_end_matches('.').to_lowercase();
        match normalized.as_str() {
            "subsp" | "ssp" => Some(Rank::Subspecies),
            "var" | "v" => Some(Rank::Variety),
            "subvar" => Some(Rank::Subvariety),
            "f" | "fo" | "forma" => Some(Rank::Forma),
            "subf" | "subforma" => Some(Rank::Subforma),
            _ => None,
        }
    }

    /// Canonical token used when building names
    pub fn token(self) -> Option<&'static str> {
        match self {
            Rank::Subspecies => Some("subsp."),
            Rank::Variety => Some("var."),
            Rank::Subvariety => Some("subvar."),
            Rank::Forma => Some("f."),
            Rank::Subforma => Some("subf."),
            Rank::Family | Rank::Genus | Rank::Species => None,
        }
    }

    pub fn is_infraspecific(self) -> bool {
        self > Rank::Species
    }

    /// The `subsp.`/`var.` pair is used inconsistently in historical data
    pub fn swapped(self) -> Option<Rank> {
        match self {
            Rank::Subspecies => Some(Rank::Variety),
            Rank::Variety => Some(Rank::Subspecies),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
            Rank::Subspecies => "subspecies",
            Rank::Variety => "variety",
            Rank::Subvariety => "subvariety",
            Rank::Forma => "forma",
            Rank::Subforma => "subforma",
        };
        f.write_str(label)
    }
}
