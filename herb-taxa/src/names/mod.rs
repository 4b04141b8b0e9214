//! Scientific name handling: rank lexicon and canonicalization

pub mod canonicalizer;
pub mod ranks;

pub use canonicalizer::{
    canonicalize, swap_rank_tokens, ChainEntry, HybridFormula, HybridLevel, NameError, TaxonName,
};
pub use ranks::Rank;
