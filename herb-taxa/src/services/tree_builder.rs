//! Tree insertion engine
//!
//! Walks a name's ancestor chain from the coarsest entry to the finest,
//! reusing nodes that exist and inserting the ones that do not. Because each
//! entry is handled only after its parent has been found or created, a node
//! is never persisted before its parent.
//!
//! Family nodes are never created here. A family absent from the tree is
//! tolerated only when the genus already exists under some family.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::taxa;
use crate::error::{TaxaError, TaxaResult};
use crate::models::{NewTaxon, ResolutionCandidate, TaxonId};
use crate::names::{ChainEntry, Rank, TaxonName};
use crate::services::local_resolver::LocalResolver;

/// Minimum match confidence for attributing an author to a created node
pub const AUTHOR_MIN_CONFIDENCE: f64 = 0.90;

pub struct TreeBuilder {
    pool: SqlitePool,
    resolver: LocalResolver,
    creator_id: i64,
    max_lock_wait_ms: u64,
}

impl TreeBuilder {
    pub fn new(pool: SqlitePool, creator_id: i64, max_lock_wait_ms: u64) -> Self {
        Self {
            resolver: LocalResolver::new(pool.clone()),
            pool,
            creator_id,
            max_lock_wait_ms,
        }
    }

    /// Ensure `name` and all of its ancestors exist; return the finest node
    ///
    /// `candidate` is the accepted external match, if the name went through
    /// external resolution. Its author is only ever applied to the finest
    /// entry.
    ///
    /// Every node created is pushed onto `created` as soon as it is
    /// persisted, coarsest first, so the caller still sees them when a later
    /// entry of the chain fails.
    pub async fn insert(
        &self,
        name: &TaxonName,
        candidate: Option<&ResolutionCandidate>,
        created: &mut Vec<TaxonId>,
    ) -> TaxaResult<TaxonId> {
        let chain = name.ancestor_chain();
        let full_name = name.full_name();
        let mut parent: Option<(TaxonId, Rank)> = None;

        for (depth, entry) in chain.iter().enumerate().rev() {
            let is_finest = depth == 0;

            if let Some(id) = self.find_entry(name, entry).await? {
                parent = Some((id, entry.rank));
                continue;
            }

            if entry.rank == Rank::Family {
                // Absent family: the genus must already exist to anchor the chain
                debug!(family = %entry.name, name = %full_name, "Family not in tree");
                continue;
            }

            let (parent_id, parent_rank) = parent.ok_or_else(|| TaxaError::MissingFamily {
                name: full_name.clone(),
                detail: match &name.family {
                    Some(family) => format!("family '{}' and genus '{}' not in tree", family, entry.name),
                    None => format!("no family given and '{}' not in tree", entry.name),
                },
            })?;

            if entry.rank <= parent_rank {
                return Err(TaxaError::TreeIntegrity(format!(
                    "'{}' ({}) cannot be placed under a {} node",
                    entry.name, entry.rank, parent_rank
                )));
            }

            let author = if is_finest {
                author_for(entry, candidate)
            } else {
                None
            };

            let inserted = self.insert_entry(entry, parent_id, author).await?;
            if let Some(id) = inserted.created() {
                created.push(id);
            }
            parent = Some((inserted.id(), entry.rank));
        }

        match parent {
            Some((taxon_id, _)) => Ok(taxon_id),
            None => Err(TaxaError::MissingFamily {
                name: full_name,
                detail: "family not in tree".to_string(),
            }),
        }
    }

    async fn find_entry(&self, name: &TaxonName, entry: &ChainEntry) -> TaxaResult<Option<TaxonId>> {
        let found = if entry.is_hybrid {
            self.resolver
                .find_hybrid(&name.gen_spec(), name.hybrid_terms())
                .await?
        } else {
            self.resolver
                .find_exact(&entry.name, false, Some(&entry.terminal_name))
                .await?
        };
        Ok(found)
    }

    async fn insert_entry(
        &self,
        entry: &ChainEntry,
        parent_id: TaxonId,
        author: Option<String>,
    ) -> TaxaResult<Inserted> {
        // Parent must be visible before the child goes in
        if taxa::load_taxon(&self.pool, parent_id).await?.is_none() {
            return Err(TaxaError::TreeIntegrity(format!(
                "parent {} of '{}' does not exist",
                parent_id, entry.name
            )));
        }

        let taxon = NewTaxon {
            full_name: entry.name.clone(),
            terminal_name: entry.terminal_name.clone(),
            rank: entry.rank,
            parent_id: Some(parent_id),
            author,
            is_hybrid: entry.is_hybrid,
            created_by: self.creator_id,
        };

        let (id, was_created) = taxa::insert_taxon(&self.pool, &taxon, self.max_lock_wait_ms).await?;

        if was_created {
            info!(
                taxon_id = id,
                full_name = %taxon.full_name,
                rank = %taxon.rank,
                parent_id,
                author = taxon.author.as_deref().unwrap_or(""),
                "Created taxon node"
            );
            Ok(Inserted::Created(id))
        } else {
            debug!(taxon_id = id, full_name = %taxon.full_name, "Node appeared concurrently, reusing");
            Ok(Inserted::Existing(id))
        }
    }
}

enum Inserted {
    Created(TaxonId),
    Existing(TaxonId),
}

impl Inserted {
    fn id(&self) -> TaxonId {
        match self {
            Inserted::Created(id) | Inserted::Existing(id) => *id,
        }
    }

    fn created(&self) -> Option<TaxonId> {
        match self {
            Inserted::Created(id) => Some(*id),
            Inserted::Existing(_) => None,
        }
    }
}

/// Authors go on species-or-finer, non-hybrid entries matched with enough confidence
fn author_for(entry: &ChainEntry, candidate: Option<&ResolutionCandidate>) -> Option<String> {
    let candidate = candidate?;
    if entry.is_hybrid || entry.rank < Rank::Species || candidate.confidence < AUTHOR_MIN_CONFIDENCE {
        return None;
    }
    candidate.attribution().map(str::to_string)
}
