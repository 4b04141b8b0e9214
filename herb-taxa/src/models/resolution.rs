//! Resolution outcomes and the per-row context passed between stages

use serde::{Deserialize, Serialize};

use super::taxon::TaxonId;
use crate::names::TaxonName;

/// Outcome of resolving one name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    /// Name maps to an existing (or newly created) node
    Found(TaxonId),
    /// Not in the tree yet
    NotFound,
    /// Excluded from tree insertion, with the reason
    Rejected(String),
}

/// Best match returned by the external name resolution service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionCandidate {
    /// Name as submitted (after any rank rewrite)
    pub submitted_name: String,
    pub matched_name: Option<String>,
    pub author: Option<String>,
    pub accepted_author: Option<String>,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    pub unmatched_terms: Option<String>,
    /// True when the winning submission used the `var.`/`subsp.` swapped form
    pub rank_swapped: bool,
}

impl ResolutionCandidate {
    /// Candidate for a name the service returned nothing for
    pub fn unmatched(submitted_name: impl Into<String>) -> Self {
        Self {
            submitted_name: submitted_name.into(),
            matched_name: None,
            author: None,
            accepted_author: None,
            confidence: 0.0,
            unmatched_terms: None,
            rank_swapped: false,
        }
    }

    /// Author to attribute: the matched author, falling back to the accepted-name author
    pub fn attribution(&self) -> Option<&str> {
        self.author
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .or_else(|| self.accepted_author.as_deref().filter(|a| !a.trim().is_empty()))
    }
}

/// Verdict on an external candidate after thresholding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchStatus {
    Accepted,
    Rejected(String),
}

/// Per-row state carried through canonicalize → local → external → insert
///
/// Each stage consumes the context and returns an updated one.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub row_id: String,
    pub name: TaxonName,
    pub resolution: Resolution,
    pub candidate: Option<ResolutionCandidate>,
}

impl ResolutionContext {
    pub fn new(row_id: impl Into<String>, name: TaxonName) -> Self {
        Self {
            row_id: row_id.into(),
            name,
            resolution: Resolution::NotFound,
            candidate: None,
        }
    }

    pub fn with_resolution(self, resolution: Resolution) -> Self {
        Self { resolution, ..self }
    }

    /// Attach an external candidate, switching to the rank-swapped name when that form won
    pub fn with_candidate(self, candidate: ResolutionCandidate) -> Self {
        let name = if candidate.rank_swapped {
            self.name.with_swapped_rank().unwrap_or(self.name)
        } else {
            self.name
        };
        Self {
            name,
            candidate: Some(candidate),
            ..self
        }
    }
}
