//! Local match resolver
//!
//! Looks a canonical name up in the persisted tree. A miss is a normal
//! outcome (`Resolution::NotFound`) that routes the name to the external
//! client.

use herb_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::taxa;
use crate::models::{Resolution, TaxonId};
use crate::names::TaxonName;

pub struct LocalResolver {
    pool: SqlitePool,
}

impl LocalResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve a structured name against the tree
    pub async fn resolve(&self, name: &TaxonName) -> Result<Resolution> {
        let found = if name.is_hybrid() {
            self.find_hybrid(&name.gen_spec(), name.hybrid_terms()).await?
        } else {
            let terminal = name.terminal_name();
            self.find_exact(&name.full_name(), false, Some(&terminal)).await?
        };

        Ok(match found {
            Some(id) => Resolution::Found(id),
            None => Resolution::NotFound,
        })
    }

    /// Exact, case-respecting lookup by full name
    ///
    /// Non-hybrid names with `subsp.` get one retry with `var.` in its place;
    /// the two are used interchangeably in historical data.
    pub async fn find_exact(
        &self,
        full_name: &str,
        is_hybrid: bool,
        terminal_hint: Option<&str>,
    ) -> Result<Option<TaxonId>> {
        if let Some(id) = taxa::find_id_by_full_name(&self.pool, full_name, is_hybrid, terminal_hint).await? {
            return Ok(Some(id));
        }

        if is_hybrid {
            return Ok(None);
        }

        match subspecies_as_variety(full_name) {
            Some(retry_name) => {
                let id = taxa::find_id_by_full_name(&self.pool, &retry_name, false, terminal_hint).await?;
                if id.is_some() {
                    debug!(submitted = %full_name, matched = %retry_name, "Matched after subsp. -> var. rewrite");
                }
                Ok(id)
            }
            None => Ok(None),
        }
    }

    /// Order-insensitive hybrid lookup
    ///
    /// A candidate matches when its full name starts with `base` and contains
    /// every term; the shortest such name wins.
    pub async fn find_hybrid(&self, base: &str, terms: &[String]) -> Result<Option<TaxonId>> {
        let candidates = taxa::find_hybrid_candidates(&self.pool, base).await?;

        Ok(candidates
            .into_iter()
            .find(|(_, full_name)| terms.iter().all(|term| full_name.contains(term.as_str())))
            .map(|(id, _)| id))
    }
}

fn subspecies_as_variety(full_name: &str) -> Option<String> {
    let mut changed = false;
    let tokens: Vec<&str> = full_name
        .split_whitespace()
        .map(|token| {
            if token == "subsp." {
                changed = true;
                "var."
            } else {
                token
            }
        })
        .collect();
    changed.then(|| tokens.join(" "))
}
