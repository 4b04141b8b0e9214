//! Batch provenance ledger operations

use herb_common::{time, Result};
use sqlx::{Row, SqlitePool};

use crate::models::BatchRecord;
use crate::utils::retry_on_lock;

/// Record a completed (or aborted) import batch
pub async fn record_batch(pool: &SqlitePool, batch: &BatchRecord, max_wait_ms: u64) -> Result<()> {
    let start_ms = time::to_millis(&batch.start_time);
    let end_ms = time::to_millis(&batch.end_time);

    retry_on_lock("record batch", max_wait_ms, || async {
        sqlx::query(
            r#"
            INSERT INTO import_batches (token, start_time, end_time, creator_id, size)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&batch.token)
        .bind(start_ms)
        .bind(end_ms)
        .bind(batch.creator_id)
        .bind(batch.size)
        .execute(pool)
        .await?;
        Ok(())
    })
    .await
}

pub async fn load_batch(pool: &SqlitePool, token: &str) -> Result<Option<BatchRecord>> {
    let row = sqlx::query(
        "SELECT token, start_time, end_time, creator_id, size FROM import_batches WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| BatchRecord {
        token: row.get("token"),
        start_time: time::from_millis(row.get("start_time")),
        end_time: time::from_millis(row.get("end_time")),
        creator_id: row.get("creator_id"),
        size: row.get("size"),
    }))
}

/// Remove a batch from the ledger; returns whether it existed
pub async fn delete_batch(pool: &SqlitePool, token: &str, max_wait_ms: u64) -> Result<bool> {
    retry_on_lock("delete batch", max_wait_ms, || async {
        let result = sqlx::query("DELETE FROM import_batches WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    })
    .await
}
