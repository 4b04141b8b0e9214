//! Name canonicalizer
//!
//! Turns a row of raw label fields into a structured [`TaxonName`]. All the
//! strings the rest of the engine works with (`full_name`, `first_intra`,
//! `gen_spec`, `terminal_name`, the ancestor chain) are derived from that
//! structure on demand, so a rewrite of one rank token is reflected in every
//! derived form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ranks::Rank;
use crate::models::RawNameRow;

/// Identification qualifiers that are not part of the name itself
const QUALIFIER_MARKERS: &[&str] = &[
    "cf.", "cf", "aff.", "aff", "nr.", "?", "sp.", "spp.", "s.l.", "s.str.", "agg.",
];

/// Tokens separating the terms of a hybrid formula
const HYBRID_MARKERS: &[&str] = &["x", "X", "×"];

pub const MAX_HYBRID_TERMS: usize = 3;

/// Canonicalizer input failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NameError {
    /// Row has no genus; `family` is what the caller may fall back to
    #[error("row has no genus")]
    MissingGenus { family: Option<String> },

    #[error("unknown infraspecific rank token '{0}'")]
    UnknownRank(String),

    #[error("epithet '{0}' has no rank token")]
    EpithetWithoutRank(String),

    #[error("infraspecific name '{0}' given without a species")]
    MissingSpecies(String),

    #[error("rank {inner} cannot follow {outer}")]
    RankOutOfOrder { outer: Rank, inner: Rank },

    #[error("invalid hybrid formula: {0}")]
    InvalidHybrid(String),
}

/// Level the hybrid formula attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HybridLevel {
    /// `Salix alba x fragilis`: cross of species within a genus
    Genus,
    /// `Castilleja miniata dixonii x elata`: cross below a species
    Species,
}

/// Parsed hybrid formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridFormula {
    pub level: HybridLevel,
    /// Constituent terms in transcription order (at most three)
    pub terms: Vec<String>,
}

impl HybridFormula {
    pub fn formula(&self) -> String {
        self.terms.join(" x ")
    }
}

/// One entry of a name's ancestor chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub name: String,
    pub terminal_name: String,
    pub rank: Rank,
    pub is_hybrid: bool,
}

/// Structured scientific name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonName {
    pub family: Option<String>,
    /// None only for family-only names
    pub genus: Option<String>,
    pub species: Option<String>,
    /// Infraspecific (rank, epithet) pairs, coarse to fine
    pub infraspecific: Vec<(Rank, String)>,
    pub hybrid: Option<HybridFormula>,
    /// Informal name kept for infraspecific hybrids that are resolved at species level
    pub hybrid_base: Option<String>,
    /// Identification qualifier (`cf.`, `aff.`) carried for downstream records
    pub qualifier: Option<String>,
}

/// Build a structured name from raw label fields
pub fn canonicalize(row: &RawNameRow) -> Result<TaxonName, NameError> {
    let family = clean(row.family.as_deref());
    let genus = match clean(row.genus.as_deref()) {
        Some(genus) => genus,
        None => return Err(NameError::MissingGenus { family }),
    };
    let mut species = clean(row.species.as_deref());

    let mut infraspecific: Vec<(Rank, String)> = Vec::new();
    // Rank tokens given without an epithet; only meaningful for hybrids
    let mut bare_ranks: Vec<Rank> = Vec::new();
    let mut last_rank: Option<Rank> = None;

    for (rank_field, epithet_field) in [
        (row.rank1.as_deref(), row.epithet1.as_deref()),
        (row.rank2.as_deref(), row.epithet2.as_deref()),
    ] {
        let token = non_blank(rank_field);
        let epithet = clean(epithet_field);

        let token = match (token, epithet.as_ref()) {
            (None, None) => continue,
            (None, Some(e)) => return Err(NameError::EpithetWithoutRank(e.clone())),
            (Some(token), _) => token,
        };

        let rank = Rank::from_token(&token)
            .filter(|r| r.is_infraspecific())
            .ok_or_else(|| NameError::UnknownRank(token.clone()))?;

        if let Some(outer) = last_rank {
            if rank <= outer {
                return Err(NameError::RankOutOfOrder { outer, inner: rank });
            }
        }
        last_rank = Some(rank);

        match epithet {
            Some(epithet) => infraspecific.push((rank, epithet)),
            None => bare_ranks.push(rank),
        }
    }

    if species.is_none() {
        if let Some((_, epithet)) = infraspecific.first() {
            return Err(NameError::MissingSpecies(epithet.clone()));
        }
    }

    if !row.hybrid {
        return Ok(TaxonName {
            family,
            genus: Some(genus),
            species,
            infraspecific,
            hybrid: None,
            hybrid_base: None,
            qualifier: non_blank(row.qualifier.as_deref()),
        });
    }

    // Hybrid formula comes from the qualifier, or failing that from the
    // deepest field that contains a hybrid marker. A qualifier holding only
    // `cf.`/`aff.` carries no formula.
    let formula_text = match clean(row.qualifier.as_deref()) {
        Some(text) => text,
        None => {
            let in_epithet = infraspecific
                .last()
                .map(|(_, e)| contains_hybrid_marker(e))
                .unwrap_or(false);
            if in_epithet {
                let (rank, epithet) = infraspecific.pop().ok_or_else(|| {
                    NameError::InvalidHybrid("no hybrid formula".to_string())
                })?;
                bare_ranks.push(rank);
                epithet
            } else if species.as_deref().map(contains_hybrid_marker).unwrap_or(false) {
                species.take().unwrap_or_default()
            } else {
                return Err(NameError::InvalidHybrid(
                    "hybrid flag set but no formula given".to_string(),
                ));
            }
        }
    };
    let terms = split_hybrid_terms(&formula_text)?;

    if infraspecific.is_empty() && bare_ranks.is_empty() {
        let level = if species.is_some() {
            HybridLevel::Species
        } else {
            HybridLevel::Genus
        };
        return Ok(TaxonName {
            family,
            genus: Some(genus),
            species,
            infraspecific,
            hybrid: Some(HybridFormula { level, terms }),
            hybrid_base: None,
            qualifier: None,
        });
    }

    // A rank marker is present: the marker-bearing string becomes the
    // informal base and the name is truncated to the pre-hybrid portion
    let species = match species {
        Some(species) => species,
        None => return Err(NameError::MissingSpecies(formula_text)),
    };
    let mut parts: Vec<String> = vec![genus.clone(), species.clone()];
    for (rank, epithet) in &infraspecific {
        parts.push(rank.token().unwrap_or_default().to_string());
        parts.push(epithet.clone());
    }
    for rank in &bare_ranks {
        parts.push(rank.token().unwrap_or_default().to_string());
    }
    parts.push(terms.join(" x "));

    Ok(TaxonName {
        family,
        genus: Some(genus),
        species: Some(species),
        infraspecific: Vec::new(),
        hybrid: None,
        hybrid_base: Some(parts.join(" ")),
        qualifier: None,
    })
}

impl TaxonName {
    /// Family-level name, used when a row carries no genus
    pub fn family_only(family: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
            genus: None,
            species: None,
            infraspecific: Vec::new(),
            hybrid: None,
            hybrid_base: None,
            qualifier: None,
        }
    }

    pub fn is_hybrid(&self) -> bool {
        self.hybrid.is_some()
    }

    pub fn hybrid_terms(&self) -> &[String] {
        self.hybrid.as_ref().map(|h| h.terms.as_slice()).unwrap_or(&[])
    }

    /// Genus and species only (genus alone, or the family for family-only names)
    pub fn gen_spec(&self) -> String {
        match (&self.genus, &self.species) {
            (Some(genus), Some(species)) => format!("{} {}", genus, species),
            (Some(genus), None) => genus.clone(),
            (None, _) => self.family.clone().unwrap_or_default(),
        }
    }

    /// Name truncated to the first infraspecific rank
    pub fn first_intra(&self) -> String {
        match self.infraspecific.first() {
            Some((rank, epithet)) => format!(
                "{} {} {}",
                self.gen_spec(),
                rank.token().unwrap_or_default(),
                epithet
            ),
            None => self.gen_spec(),
        }
    }

    /// All present ranks in nomenclatural order
    pub fn full_name(&self) -> String {
        if let Some(hybrid) = &self.hybrid {
            return format!("{} {}", self.gen_spec(), hybrid.formula());
        }
        let mut name = self.gen_spec();
        for (rank, epithet) in &self.infraspecific {
            name.push(' ');
            name.push_str(rank.token().unwrap_or_default());
            name.push(' ');
            name.push_str(epithet);
        }
        name
    }

    /// The deepest epithet present
    pub fn terminal_name(&self) -> String {
        if let Some(hybrid) = &self.hybrid {
            return hybrid.formula();
        }
        self.infraspecific
            .last()
            .map(|(_, epithet)| epithet.clone())
            .or_else(|| self.species.clone())
            .or_else(|| self.genus.clone())
            .or_else(|| self.family.clone())
            .unwrap_or_default()
    }

    /// Rank of the deepest entry
    pub fn rank(&self) -> Rank {
        match &self.hybrid {
            Some(HybridFormula {
                level: HybridLevel::Genus,
                ..
            }) => return Rank::Species,
            Some(HybridFormula {
                level: HybridLevel::Species,
                ..
            }) => return Rank::Subspecies,
            None => {}
        }
        if let Some((rank, _)) = self.infraspecific.last() {
            *rank
        } else if self.species.is_some() {
            Rank::Species
        } else if self.genus.is_some() {
            Rank::Genus
        } else {
            Rank::Family
        }
    }

    /// Ancestor chain `[full_name, first_intra, gen_spec, genus, family]`,
    /// finest first, with duplicate names collapsed
    pub fn ancestor_chain(&self) -> Vec<ChainEntry> {
        let mut chain = vec![ChainEntry {
            name: self.full_name(),
            terminal_name: self.terminal_name(),
            rank: self.rank(),
            is_hybrid: self.is_hybrid(),
        }];

        if let Some((rank, epithet)) = self.infraspecific.first() {
            chain.push(ChainEntry {
                name: self.first_intra(),
                terminal_name: epithet.clone(),
                rank: *rank,
                is_hybrid: false,
            });
        }
        if let (Some(_), Some(species)) = (&self.genus, &self.species) {
            chain.push(ChainEntry {
                name: self.gen_spec(),
                terminal_name: species.clone(),
                rank: Rank::Species,
                is_hybrid: false,
            });
        }
        if let Some(genus) = &self.genus {
            chain.push(ChainEntry {
                name: genus.clone(),
                terminal_name: genus.clone(),
                rank: Rank::Genus,
                is_hybrid: false,
            });
        }
        if let Some(family) = &self.family {
            chain.push(ChainEntry {
                name: family.clone(),
                terminal_name: family.clone(),
                rank: Rank::Family,
                is_hybrid: false,
            });
        }

        let mut seen = std::collections::HashSet::new();
        chain.retain(|entry| seen.insert((entry.name.clone(), entry.is_hybrid)));
        chain
    }

    /// Same name with every `subsp.` and `var.` swapped for the other
    ///
    /// None when the name has neither rank, or when the swap would leave the
    /// infraspecific ranks out of order (`subsp. a var. b`).
    pub fn with_swapped_rank(&self) -> Option<TaxonName> {
        if !self.infraspecific.iter().any(|(rank, _)| rank.swapped().is_some()) {
            return None;
        }
        let mut swapped = self.clone();
        for (rank, _) in swapped.infraspecific.iter_mut() {
            if let Some(other) = rank.swapped() {
                *rank = other;
            }
        }
        ranks_strictly_increase(swapped.infraspecific.iter().map(|(rank, _)| *rank)).then_some(swapped)
    }
}

/// Swap `subsp.` and `var.` tokens in an already-built name string
///
/// Same rules as [`TaxonName::with_swapped_rank`]: None when nothing changes
/// or the swapped rank tokens are out of order.
pub fn swap_rank_tokens(name: &str) -> Option<String> {
    let mut changed = false;
    let tokens: Vec<&str> = name
        .split_whitespace()
        .map(|token| match token {
            "subsp." => {
                changed = true;
                "var."
            }
            "var." => {
                changed = true;
                "subsp."
            }
            other => other,
        })
        .collect();
    if !changed {
        return None;
    }
    let ranks = tokens
        .iter()
        .filter_map(|token| Rank::all().into_iter().find(|rank| rank.token() == Some(*token)));
    ranks_strictly_increase(ranks).then(|| tokens.join(" "))
}

fn ranks_strictly_increase(ranks: impl IntoIterator<Item = Rank>) -> bool {
    let ranks: Vec<Rank> = ranks.into_iter().collect();
    ranks.windows(2).all(|pair| pair[0] < pair[1])
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trim, drop qualifier markers, collapse whitespace
fn clean(value: Option<&str>) -> Option<String> {
    let value = value?;
    let kept: Vec<&str> = value
        .split_whitespace()
        .filter(|token| !QUALIFIER_MARKERS.contains(token))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

fn contains_hybrid_marker(value: &str) -> bool {
    value.contains('×') || value.split_whitespace().any(|t| HYBRID_MARKERS.contains(&t))
}

/// Split a hybrid formula into its terms
fn split_hybrid_terms(formula: &str) -> Result<Vec<String>, NameError> {
    let normalized = formula.replace('×', " × ");
    let mut terms = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in normalized.split_whitespace() {
        if HYBRID_MARKERS.contains(&token) {
            if !current.is_empty() {
                terms.push(current.join(" "));
                current.clear();
            }
        } else if !QUALIFIER_MARKERS.contains(&token) {
            current.push(token);
        }
    }
    if !current.is_empty() {
        terms.push(current.join(" "));
    }

    if terms.is_empty() {
        return Err(NameError::InvalidHybrid(format!("no terms in '{}'", formula)));
    }
    if terms.len() > MAX_HYBRID_TERMS {
        return Err(NameError::InvalidHybrid(format!(
            "'{}' has {} terms, at most {} supported",
            formula,
            terms.len(),
            MAX_HYBRID_TERMS
        )));
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(genus: &str, species: &str) -> RawNameRow {
        RawNameRow {
            row_id: "r1".to_string(),
            family: Some("Orobanchaceae".to_string()),
            genus: Some(genus.to_string()),
            species: Some(species.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_castilleja_subspecies() {
        let mut input = row("Castilleja", "miniata");
        input.rank1 = Some("subsp.".to_string());
        input.epithet1 = Some("dixonii".to_string());

        let name = canonicalize(&input).unwrap();
        assert_eq!(name.full_name(), "Castilleja miniata subsp. dixonii");
        assert_eq!(name.first_intra(), "Castilleja miniata subsp. dixonii");
        assert_eq!(name.gen_spec(), "Castilleja miniata");
        assert_eq!(name.terminal_name(), "dixonii");
        assert_eq!(name.rank(), Rank::Subspecies);
        assert!(!name.is_hybrid());
        assert!(name.hybrid_base.is_none());
    }

    #[test]
    fn test_two_infraspecific_ranks() {
        let mut input = row("Castilleja", "miniata");
        input.rank1 = Some("ssp".to_string());
        input.epithet1 = Some("dixonii".to_string());
        input.rank2 = Some("f.".to_string());
        input.epithet2 = Some("alba".to_string());

        let name = canonicalize(&input).unwrap();
        assert_eq!(name.full_name(), "Castilleja miniata subsp. dixonii f. alba");
        assert_eq!(name.first_intra(), "Castilleja miniata subsp. dixonii");
        assert_eq!(name.terminal_name(), "alba");
        assert_eq!(name.rank(), Rank::Forma);
    }

    #[test]
    fn test_qualifier_markers_are_stripped() {
        let mut input = row("Castilleja", "cf. miniata");
        input.qualifier = Some("cf.".to_string());

        let name = canonicalize(&input).unwrap();
        assert_eq!(name.full_name(), "Castilleja miniata");
        assert_eq!(name.terminal_name(), "miniata");
        assert_eq!(name.qualifier.as_deref(), Some("cf."));
    }

    #[test]
    fn test_sp_placeholder_collapses_to_genus() {
        let name = canonicalize(&row("Castilleja", "sp.")).unwrap();
        assert_eq!(name.full_name(), "Castilleja");
        assert_eq!(name.rank(), Rank::Genus);
    }

    #[test]
    fn test_missing_genus_reports_family() {
        let input = RawNameRow {
            row_id: "r1".to_string(),
            family: Some("Rosaceae".to_string()),
            ..Default::default()
        };
        assert_eq!(
            canonicalize(&input),
            Err(NameError::MissingGenus {
                family: Some("Rosaceae".to_string())
            })
        );

        let empty = RawNameRow::new("r2");
        assert_eq!(canonicalize(&empty), Err(NameError::MissingGenus { family: None }));
    }

    #[test]
    fn test_epithet_without_rank_is_rejected() {
        let mut input = row("Castilleja", "miniata");
        input.epithet1 = Some("dixonii".to_string());
        assert_eq!(
            canonicalize(&input),
            Err(NameError::EpithetWithoutRank("dixonii".to_string()))
        );
    }

    #[test]
    fn test_unknown_and_out_of_order_ranks() {
        let mut input = row("Castilleja", "miniata");
        input.rank1 = Some("sect.".to_string());
        input.epithet1 = Some("dixonii".to_string());
        assert_eq!(canonicalize(&input), Err(NameError::UnknownRank("sect.".to_string())));

        let mut input = row("Castilleja", "miniata");
        input.rank1 = Some("var.".to_string());
        input.epithet1 = Some("dixonii".to_string());
        input.rank2 = Some("subsp.".to_string());
        input.epithet2 = Some("elata".to_string());
        assert_eq!(
            canonicalize(&input),
            Err(NameError::RankOutOfOrder {
                outer: Rank::Variety,
                inner: Rank::Subspecies
            })
        );
    }

    #[test]
    fn test_infraspecific_without_species() {
        let input = RawNameRow {
            row_id: "r1".to_string(),
            genus: Some("Castilleja".to_string()),
            rank1: Some("var.".to_string()),
            epithet1: Some("dixonii".to_string()),
            ..Default::default()
        };
        assert_eq!(
            canonicalize(&input),
            Err(NameError::MissingSpecies("dixonii".to_string()))
        );
    }

    #[test]
    fn test_genus_level_hybrid_from_qualifier() {
        let input = RawNameRow {
            row_id: "r1".to_string(),
            family: Some("Salicaceae".to_string()),
            genus: Some("Salix".to_string()),
            hybrid: true,
            qualifier: Some("alba x fragilis".to_string()),
            ..Default::default()
        };

        let name = canonicalize(&input).unwrap();
        assert!(name.is_hybrid());
        assert_eq!(name.full_name(), "Salix alba x fragilis");
        assert_eq!(name.hybrid_terms(), &["alba".to_string(), "fragilis".to_string()]);
        assert_eq!(name.rank(), Rank::Species);
        assert_eq!(name.terminal_name(), "alba x fragilis");

        let chain: Vec<String> = name.ancestor_chain().into_iter().map(|e| e.name).collect();
        assert_eq!(chain, vec!["Salix alba x fragilis", "Salix", "Salicaceae"]);
    }

    #[test]
    fn test_genus_level_hybrid_from_species_field() {
        let input = RawNameRow {
            row_id: "r1".to_string(),
            genus: Some("Salix".to_string()),
            species: Some("alba × fragilis".to_string()),
            hybrid: true,
            ..Default::default()
        };

        let name = canonicalize(&input).unwrap();
        assert_eq!(name.full_name(), "Salix alba x fragilis");
        assert!(name.species.is_none());
    }

    #[test]
    fn test_qualifier_marker_does_not_replace_field_formula() {
        let input = RawNameRow {
            row_id: "r1".to_string(),
            genus: Some("Salix".to_string()),
            species: Some("alba × fragilis".to_string()),
            hybrid: true,
            qualifier: Some("cf.".to_string()),
            ..Default::default()
        };

        let name = canonicalize(&input).unwrap();
        assert_eq!(name.full_name(), "Salix alba x fragilis");
        assert_eq!(name.hybrid_terms(), &["alba".to_string(), "fragilis".to_string()]);

        let mut marked = input.clone();
        marked.species = None;
        marked.qualifier = Some("aff. alba x fragilis".to_string());
        assert_eq!(canonicalize(&marked).unwrap().full_name(), "Salix alba x fragilis");
    }

    #[test]
    fn test_species_level_hybrid() {
        let mut input = row("Castilleja", "miniata");
        input.hybrid = true;
        input.qualifier = Some("dixonii x elata".to_string());

        let name = canonicalize(&input).unwrap();
        assert_eq!(name.full_name(), "Castilleja miniata dixonii x elata");
        assert_eq!(name.rank(), Rank::Subspecies);
        let chain: Vec<String> = name.ancestor_chain().into_iter().map(|e| e.name).collect();
        assert_eq!(
            chain,
            vec![
                "Castilleja miniata dixonii x elata",
                "Castilleja miniata",
                "Castilleja",
                "Orobanchaceae"
            ]
        );
    }

    #[test]
    fn test_infraspecific_hybrid_truncates_to_species() {
        let mut input = row("Castilleja", "miniata");
        input.rank1 = Some("var.".to_string());
        input.hybrid = true;
        input.qualifier = Some("dixonii x elata".to_string());

        let name = canonicalize(&input).unwrap();
        assert!(!name.is_hybrid());
        assert_eq!(name.full_name(), "Castilleja miniata");
        assert_eq!(
            name.hybrid_base.as_deref(),
            Some("Castilleja miniata var. dixonii x elata")
        );
    }

    #[test]
    fn test_hybrid_formula_limits() {
        let mut input = row("Salix", "alba");
        input.hybrid = true;
        input.qualifier = Some("a x b x c x d".to_string());
        assert!(matches!(canonicalize(&input), Err(NameError::InvalidHybrid(_))));

        let mut input = row("Salix", "alba");
        input.hybrid = true;
        assert!(matches!(canonicalize(&input), Err(NameError::InvalidHybrid(_))));
    }

    #[test]
    fn test_ancestor_chain_collapses_duplicates() {
        let name = canonicalize(&row("Castilleja", "miniata")).unwrap();
        let chain: Vec<(String, Rank)> = name
            .ancestor_chain()
            .into_iter()
            .map(|e| (e.name, e.rank))
            .collect();
        assert_eq!(
            chain,
            vec![
                ("Castilleja miniata".to_string(), Rank::Species),
                ("Castilleja".to_string(), Rank::Genus),
                ("Orobanchaceae".to_string(), Rank::Family),
            ]
        );
    }

    #[test]
    fn test_rank_swap_rewrites_every_derived_form() {
        let mut input = row("Castilleja", "miniata");
        input.rank1 = Some("subsp.".to_string());
        input.epithet1 = Some("dixonii".to_string());
        input.rank2 = Some("f.".to_string());
        input.epithet2 = Some("alba".to_string());

        let swapped = canonicalize(&input).unwrap().with_swapped_rank().unwrap();
        assert_eq!(swapped.full_name(), "Castilleja miniata var. dixonii f. alba");
        assert_eq!(swapped.first_intra(), "Castilleja miniata var. dixonii");

        let plain = canonicalize(&row("Castilleja", "miniata")).unwrap();
        assert!(plain.with_swapped_rank().is_none());
    }

    #[test]
    fn test_swap_rank_tokens_in_strings() {
        assert_eq!(
            swap_rank_tokens("Castilleja miniata subsp. dixonii").as_deref(),
            Some("Castilleja miniata var. dixonii")
        );
        assert_eq!(swap_rank_tokens("Castilleja miniata"), None);
        assert_eq!(
            swap_rank_tokens("Castilleja miniata var. dixonii f. alba").as_deref(),
            Some("Castilleja miniata subsp. dixonii f. alba")
        );
    }

    #[test]
    fn test_no_swap_when_ranks_would_fall_out_of_order() {
        let mut input = row("Castilleja", "miniata");
        input.rank1 = Some("subsp.".to_string());
        input.epithet1 = Some("dixonii".to_string());
        input.rank2 = Some("var.".to_string());
        input.epithet2 = Some("alba".to_string());

        let name = canonicalize(&input).unwrap();
        assert_eq!(name.full_name(), "Castilleja miniata subsp. dixonii var. alba");
        assert!(name.with_swapped_rank().is_none());
        assert_eq!(swap_rank_tokens(&name.full_name()), None);
    }

    #[test]
    fn test_family_only_name() {
        let name = TaxonName::family_only("Rosaceae");
        assert_eq!(name.full_name(), "Rosaceae");
        assert_eq!(name.rank(), Rank::Family);
        assert_eq!(name.ancestor_chain().len(), 1);
    }
}
