//! Review ledger operations
//!
//! Candidates the external service matched below the acceptance threshold
//! are kept here for manual review, tagged with the batch that produced them.

use herb_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::models::ResolutionCandidate;
use crate::utils::retry_on_lock;

/// One rejected candidate awaiting review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewEntry {
    pub id: i64,
    pub batch_token: String,
    pub row_id: String,
    pub submitted_name: String,
    pub matched_name: Option<String>,
    pub confidence: f64,
    pub reason: String,
}

pub async fn insert_review(
    pool: &SqlitePool,
    batch_token: &str,
    row_id: &str,
    candidate: &ResolutionCandidate,
    reason: &str,
    max_wait_ms: u64,
) -> Result<()> {
    retry_on_lock("insert review entry", max_wait_ms, || async {
        sqlx::query(
            r#"
            INSERT INTO needs_review (batch_token, row_id, submitted_name, matched_name, confidence, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(batch_token)
        .bind(row_id)
        .bind(&candidate.submitted_name)
        .bind(&candidate.matched_name)
        .bind(candidate.confidence)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(())
    })
    .await
}

pub async fn list_for_batch(pool: &SqlitePool, batch_token: &str) -> Result<Vec<ReviewEntry>> {
    let entries = sqlx::query_as::<_, ReviewEntry>(
        r#"
        SELECT id, batch_token, row_id, submitted_name, matched_name, confidence, reason
        FROM needs_review
        WHERE batch_token = ?
        ORDER BY id
        "#,
    )
    .bind(batch_token)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Clear a batch's review entries; returns the number removed
pub async fn delete_for_batch(pool: &SqlitePool, batch_token: &str, max_wait_ms: u64) -> Result<u64> {
    retry_on_lock("clear review entries", max_wait_ms, || async {
        let result = sqlx::query("DELETE FROM needs_review WHERE batch_token = ?")
            .bind(batch_token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_review_entries_scoped_to_batch() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        herb_common::db::init_schema(&pool).await.unwrap();

        let candidate = ResolutionCandidate {
            matched_name: Some("Castilleja miniata".to_string()),
            confidence: 0.75,
            ..ResolutionCandidate::unmatched("Castilleja miniatta")
        };

        insert_review(&pool, "a", "r1", &candidate, "LOW_CONFIDENCE", 1000).await.unwrap();
        insert_review(&pool, "a", "r2", &candidate, "LOW_CONFIDENCE", 1000).await.unwrap();
        insert_review(&pool, "b", "r3", &candidate, "LOW_CONFIDENCE", 1000).await.unwrap();

        let entries = list_for_batch(&pool, "a").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].row_id, "r1");
        assert_eq!(entries[0].matched_name.as_deref(), Some("Castilleja miniata"));
        assert!((entries[0].confidence - 0.75).abs() < f64::EPSILON);

        assert_eq!(delete_for_batch(&pool, "a", 1000).await.unwrap(), 2);
        assert!(list_for_batch(&pool, "a").await.unwrap().is_empty());
        assert_eq!(list_for_batch(&pool, "b").await.unwrap().len(), 1);
    }
}
