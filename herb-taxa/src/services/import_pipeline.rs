//! Import pipeline
//!
//! Drives one batch of raw name rows through canonicalization, local
//! resolution, one external resolution batch, and tree insertion. Stages run
//! one after another; every tree write of the run goes through a single
//! [`TreeBuilder`].
//!
//! Row-level failures skip the row. Batch- and process-level failures abort
//! the run, but a run that reached tree insertion or wrote review entries is
//! still recorded so it can be undone.

use sqlx::SqlitePool;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::db::review;
use crate::error::{ErrorSeverity, TaxaError, TaxaResult};
use crate::models::{
    ImportSummary, MatchStatus, RawNameRow, Resolution, ResolutionContext, ResolvedRow, RowError,
};
use crate::names::{canonicalize, NameError, Rank, TaxonName};
use crate::services::batch_manager::BatchRecorder;
use crate::services::local_resolver::LocalResolver;
use crate::services::resolution_client::{ExternalResolver, ResolverError};
use crate::services::tree_builder::TreeBuilder;

/// Reason code stored in the review ledger for rejected candidates
pub const LOW_CONFIDENCE: &str = "LOW_CONFIDENCE";

/// Per-run settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Agent id stamped on created nodes and on the batch
    pub creator_id: i64,
    pub batch_window_buffer_ms: u64,
    pub max_lock_wait_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            creator_id: 1,
            batch_window_buffer_ms: 1_000,
            max_lock_wait_ms: 5_000,
        }
    }
}

pub struct ImportPipeline {
    pool: SqlitePool,
    local: LocalResolver,
    external: Option<ExternalResolver>,
    config: PipelineConfig,
}

impl ImportPipeline {
    /// `external` may be None when every name is expected to resolve locally;
    /// a run that needs it then fails with a configuration error.
    pub fn new(pool: SqlitePool, external: Option<ExternalResolver>, config: PipelineConfig) -> Self {
        Self {
            local: LocalResolver::new(pool.clone()),
            pool,
            external,
            config,
        }
    }

    /// Import one batch of rows
    pub async fn run(&self, rows: &[RawNameRow]) -> TaxaResult<ImportSummary> {
        let started = Instant::now();
        let recorder = BatchRecorder::begin(self.config.creator_id, self.config.batch_window_buffer_ms);
        let mut summary = ImportSummary::new(recorder.token());
        summary.rows_total = rows.len();

        info!(token = %summary.batch_token, rows = rows.len(), "Starting import batch");

        let mut reached_insert = false;
        let result = self.process(rows, &mut summary, &mut reached_insert).await;

        if result.is_ok() || reached_insert || summary.rows_rejected > 0 {
            let recorded = recorder
                .finish(&self.pool, summary.nodes_created as i64, self.config.max_lock_wait_ms)
                .await;
            match (&result, recorded) {
                (_, Ok(_)) => {}
                (Ok(()), Err(e)) => return Err(e.into()),
                (Err(_), Err(e)) => {
                    error!(token = %summary.batch_token, error = %e, "Failed to record aborted batch")
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    token = %summary.batch_token,
                    rows_total = summary.rows_total,
                    rows_resolved = summary.rows_resolved,
                    rows_skipped = summary.rows_skipped,
                    rows_rejected = summary.rows_rejected,
                    nodes_created = summary.nodes_created,
                    duration_ms = summary.duration_ms,
                    "Import batch complete"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(
                    token = %summary.batch_token,
                    code = e.code(),
                    nodes_created = summary.nodes_created,
                    error = %e,
                    "Import batch aborted"
                );
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        rows: &[RawNameRow],
        summary: &mut ImportSummary,
        reached_insert: &mut bool,
    ) -> TaxaResult<()> {
        // Stage 1: canonicalize
        let mut contexts = Vec::with_capacity(rows.len());
        for row in rows {
            match canonicalize(row) {
                Ok(name) => contexts.push(ResolutionContext::new(row.row_id.clone(), name)),
                Err(NameError::MissingGenus { family: Some(family) }) => {
                    info!(row_id = %row.row_id, family = %family, "No genus, falling back to family");
                    contexts.push(ResolutionContext::new(row.row_id.clone(), TaxonName::family_only(family)));
                }
                Err(e) => skip_row(summary, &row.row_id, &TaxaError::from(e)),
            }
        }

        // Stage 2: local resolution
        let mut resolved_contexts = Vec::with_capacity(contexts.len());
        for ctx in contexts {
            let resolution = self.local.resolve(&ctx.name).await?;
            resolved_contexts.push(ctx.with_resolution(resolution));
        }

        // Stage 3: one external batch for everything still unknown
        let pending: Vec<(String, String)> = resolved_contexts
            .iter()
            .filter(|ctx| needs_external(ctx))
            .map(|ctx| (ctx.row_id.clone(), ctx.name.full_name()))
            .collect();

        let mut contexts = resolved_contexts;
        if !pending.is_empty() {
            let external = self
                .external
                .as_ref()
                .ok_or(TaxaError::ExternalService(ResolverError::NotConfigured))?;
            let outcomes = external.resolve_batch(&pending).await?;
            let mut by_row: HashMap<String, _> = outcomes.into_iter().map(|o| (o.row_id.clone(), o)).collect();

            let mut updated = Vec::with_capacity(contexts.len());
            for ctx in contexts {
                if !needs_external(&ctx) {
                    updated.push(ctx);
                    continue;
                }
                let Some(outcome) = by_row.remove(&ctx.row_id) else {
                    updated.push(ctx.with_resolution(Resolution::Rejected("no result returned".to_string())));
                    summary.rows_rejected += 1;
                    continue;
                };

                let ctx = ctx.with_candidate(outcome.candidate);
                let ctx = match outcome.status {
                    MatchStatus::Accepted => ctx,
                    MatchStatus::Rejected(reason) => {
                        if let Some(candidate) = &ctx.candidate {
                            review::insert_review(
                                &self.pool,
                                &summary.batch_token,
                                &ctx.row_id,
                                candidate,
                                LOW_CONFIDENCE,
                                self.config.max_lock_wait_ms,
                            )
                            .await?;
                            info!(
                                row_id = %ctx.row_id,
                                submitted = %candidate.submitted_name,
                                matched = candidate.matched_name.as_deref().unwrap_or(""),
                                confidence = candidate.confidence,
                                reason = %reason,
                                "Candidate rejected, sent to review"
                            );
                        }
                        summary.rows_rejected += 1;
                        ctx.with_resolution(Resolution::Rejected(reason))
                    }
                };
                updated.push(ctx);
            }
            contexts = updated;
        }

        // Stage 4: insert what is still missing, parent-first
        *reached_insert = true;
        let builder = TreeBuilder::new(self.pool.clone(), self.config.creator_id, self.config.max_lock_wait_ms);
        for ctx in contexts {
            let taxon_id = match &ctx.resolution {
                Resolution::Found(id) => *id,
                Resolution::Rejected(_) => continue,
                Resolution::NotFound => {
                    // Ancestors created before a failure still belong to the batch
                    let mut created = Vec::new();
                    let inserted = builder.insert(&ctx.name, ctx.candidate.as_ref(), &mut created).await;
                    summary.nodes_created += created.len();
                    match inserted {
                        Ok(id) => id,
                        Err(e) if e.severity() == ErrorSeverity::Row => {
                            skip_row(summary, &ctx.row_id, &e);
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
            };

            summary.resolved.push(ResolvedRow {
                row_id: ctx.row_id.clone(),
                full_name: ctx.name.full_name(),
                taxon_id,
            });
            summary.rows_resolved += 1;
        }

        Ok(())
    }
}

/// Family-only names are never submitted externally; the tree builder reports them missing
fn needs_external(ctx: &ResolutionContext) -> bool {
    ctx.resolution == Resolution::NotFound && ctx.name.rank() != Rank::Family
}

fn skip_row(summary: &mut ImportSummary, row_id: &str, err: &TaxaError) {
    warn!(row_id = %row_id, code = err.code(), error = %err, "Skipping row");
    summary.errors.push(RowError::new(row_id, err.code(), err.to_string()));
    summary.rows_skipped += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        herb_common::db::init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_invalid_rows_are_skipped_with_reason() {
        let pool = test_pool().await;
        let pipeline = ImportPipeline::new(pool, None, PipelineConfig::default());

        let rows = vec![
            RawNameRow::new("empty"),
            RawNameRow {
                genus: Some("Castilleja".to_string()),
                species: Some("miniata".to_string()),
                rank1: Some("sect.".to_string()),
                epithet1: Some("dixonii".to_string()),
                ..RawNameRow::new("bad-rank")
            },
        ];

        let summary = pipeline.run(&rows).await.unwrap();
        assert_eq!(summary.rows_total, 2);
        assert_eq!(summary.rows_skipped, 2);
        assert_eq!(summary.count_by_code("INVALID_NAME"), 2);
        assert_eq!(summary.nodes_created, 0);
    }

    #[tokio::test]
    async fn test_unknown_name_without_resolver_aborts() {
        let pool = test_pool().await;
        let pipeline = ImportPipeline::new(pool, None, PipelineConfig::default());

        let rows = vec![RawNameRow {
            genus: Some("Castilleja".to_string()),
            ..RawNameRow::new("r1")
        }];

        let result = pipeline.run(&rows).await;
        assert!(matches!(
            result,
            Err(TaxaError::ExternalService(ResolverError::NotConfigured))
        ));
    }

    #[tokio::test]
    async fn test_missing_family_fallback_is_row_error() {
        let pool = test_pool().await;
        let pipeline = ImportPipeline::new(pool, None, PipelineConfig::default());

        let rows = vec![RawNameRow {
            family: Some("Orobanchaceae".to_string()),
            ..RawNameRow::new("r1")
        }];

        let summary = pipeline.run(&rows).await.unwrap();
        assert_eq!(summary.count_by_code("MISSING_FAMILY"), 1);
        assert_eq!(summary.rows_resolved, 0);
    }
}
