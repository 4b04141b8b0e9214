//! Batch lifecycle manager
//!
//! Records each import run's provenance (token, padded time window, creator)
//! and undoes a run by pruning the leaves it created until a pass deletes
//! nothing.
//!
//! Only leaves are ever removed, so an interrupted undo leaves a valid tree
//! that a second undo of the same token continues pruning.

use chrono::{DateTime, Duration, Utc};
use herb_common::{time, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{batches, review, taxa};
use crate::error::{TaxaError, TaxaResult};
use crate::models::{BatchRecord, UndoReport};

/// Tracks an in-progress import run until its window is recorded
#[derive(Debug, Clone)]
pub struct BatchRecorder {
    token: String,
    creator_id: i64,
    started_at: DateTime<Utc>,
    window_buffer: Duration,
}

impl BatchRecorder {
    /// Open a new batch; the window starts now
    pub fn begin(creator_id: i64, window_buffer_ms: u64) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            creator_id,
            started_at: time::now(),
            window_buffer: Duration::milliseconds(i64::try_from(window_buffer_ms).unwrap_or(i64::MAX / 2)),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn creator_id(&self) -> i64 {
        self.creator_id
    }

    /// Close the window and write it to the provenance ledger
    ///
    /// Both ends are padded by the window buffer to absorb skew between
    /// when timestamps are read and when rows become visible.
    pub async fn finish(self, pool: &SqlitePool, size: i64, max_wait_ms: u64) -> Result<BatchRecord> {
        let record = BatchRecord {
            token: self.token,
            start_time: self.started_at - self.window_buffer,
            end_time: time::now() + self.window_buffer,
            creator_id: self.creator_id,
            size,
        };

        batches::record_batch(pool, &record, max_wait_ms).await?;

        info!(
            token = %record.token,
            creator_id = record.creator_id,
            size = record.size,
            start_ms = time::to_millis(&record.start_time),
            end_ms = time::to_millis(&record.end_time),
            "Recorded import batch"
        );
        Ok(record)
    }
}

/// Undo side of the batch lifecycle
pub struct BatchManager {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl BatchManager {
    pub fn new(pool: SqlitePool, max_lock_wait_ms: u64) -> Self {
        Self {
            pool,
            max_lock_wait_ms,
        }
    }

    /// Delete exactly the nodes a batch created
    ///
    /// Each pass deletes the nodes stamped with the batch's creator inside
    /// its window that currently have no children. Nodes created by other
    /// batches under this batch's nodes keep their ancestors alive.
    pub async fn undo(&self, token: &str) -> TaxaResult<UndoReport> {
        let batch = batches::load_batch(&self.pool, token)
            .await?
            .ok_or_else(|| TaxaError::BatchUnknown(token.to_string()))?;

        let start_ms = time::to_millis(&batch.start_time);
        let end_ms = time::to_millis(&batch.end_time);

        info!(token, creator_id = batch.creator_id, start_ms, end_ms, "Undoing import batch");

        let mut report = UndoReport {
            token: token.to_string(),
            ..Default::default()
        };

        loop {
            let deleted = taxa::delete_leaves_in_window(
                &self.pool,
                batch.creator_id,
                start_ms,
                end_ms,
                self.max_lock_wait_ms,
            )
            .await?;

            if deleted.is_empty() {
                break;
            }

            let count = deleted.len() as u64;
            report.deleted_per_pass.push(count);
            report.total_deleted += count;
            info!(
                token,
                pass = report.deleted_per_pass.len(),
                deleted = count,
                names = ?deleted,
                "Pruning pass"
            );
        }

        let orphans = taxa::find_orphans(&self.pool).await?;
        if !orphans.is_empty() {
            return Err(TaxaError::TreeIntegrity(format!(
                "{} node(s) left without a parent after undo of {}: {:?}",
                orphans.len(),
                token,
                orphans
            )));
        }

        if report.total_deleted != batch.size.max(0) as u64 {
            warn!(
                token,
                recorded_size = batch.size,
                deleted = report.total_deleted,
                "Deleted count differs from recorded batch size"
            );
        }

        report.review_entries_cleared =
            review::delete_for_batch(&self.pool, token, self.max_lock_wait_ms).await?;
        batches::delete_batch(&self.pool, token, self.max_lock_wait_ms).await?;

        info!(
            token,
            passes = report.deleted_per_pass.len(),
            total_deleted = report.total_deleted,
            "Batch undone"
        );
        Ok(report)
    }
}
