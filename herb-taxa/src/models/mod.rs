//! Data models for the taxon engine

pub mod batch;
pub mod import_result;
pub mod name_row;
pub mod resolution;
pub mod taxon;

pub use batch::{BatchRecord, UndoReport};
pub use import_result::{ImportSummary, ResolvedRow, RowError};
pub use name_row::RawNameRow;
pub use resolution::{MatchStatus, Resolution, ResolutionCandidate, ResolutionContext};
pub use taxon::{NewTaxon, TaxonId, TaxonNode};
