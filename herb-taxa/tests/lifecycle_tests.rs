//! Batch lifecycle integration tests
//!
//! Import runs followed by undo, including batches whose nodes other
//! batches have built on.

mod helpers;

use helpers::{assert_no_orphans, create_test_db, seed_taxon, StubService};
use herb_taxa::db::{batches, review, taxa};
use herb_taxa::models::RawNameRow;
use herb_taxa::names::Rank;
use herb_taxa::services::{BatchManager, ExternalResolver, ImportPipeline, PipelineConfig};
use herb_taxa::TaxaError;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

fn pipeline(pool: &SqlitePool, stub: &Arc<StubService>, creator_id: i64) -> ImportPipeline {
    let config = PipelineConfig {
        creator_id,
        batch_window_buffer_ms: 5,
        max_lock_wait_ms: 1000,
    };
    ImportPipeline::new(pool.clone(), Some(ExternalResolver::new(stub.clone(), 100)), config)
}

fn row(row_id: &str, species: &str, rank: Option<(&str, &str)>) -> RawNameRow {
    RawNameRow {
        family: Some("Orobanchaceae".to_string()),
        genus: Some("Castilleja".to_string()),
        species: Some(species.to_string()),
        rank1: rank.map(|(token, _)| token.to_string()),
        epithet1: rank.map(|(_, epithet)| epithet.to_string()),
        ..RawNameRow::new(row_id)
    }
}

fn stub() -> Arc<StubService> {
    Arc::new(
        StubService::new()
            .with("Castilleja miniata", 1.0, Some("Douglas ex Hook."))
            .with("Castilleja miniata var. dixonii", 1.0, None)
            .with("Castilleja elata", 0.3, None),
    )
}

#[tokio::test]
async fn test_import_then_undo_restores_tree() {
    let (_dir, pool) = create_test_db().await;
    seed_taxon(&pool, "Orobanchaceae", Rank::Family, None).await;
    let stub = stub();

    let summary = pipeline(&pool, &stub, 3)
        .run(&[
            row("r1", "miniata", Some(("var.", "dixonii"))),
            row("r2", "elata", None),
        ])
        .await
        .unwrap();
    assert_eq!(summary.nodes_created, 3);
    assert_eq!(summary.rows_rejected, 1);

    let report = BatchManager::new(pool.clone(), 1000)
        .undo(&summary.batch_token)
        .await
        .unwrap();

    assert_eq!(report.deleted_per_pass, vec![1, 1, 1]);
    assert_eq!(report.total_deleted, 3);
    assert_eq!(report.review_entries_cleared, 1);
    assert_eq!(taxa::count_taxa(&pool).await.unwrap(), 1);
    assert!(review::list_for_batch(&pool, &summary.batch_token).await.unwrap().is_empty());
    assert!(batches::load_batch(&pool, &summary.batch_token).await.unwrap().is_none());
    assert_no_orphans(&pool).await;
}

#[tokio::test]
async fn test_undo_twice_reports_unknown_batch() {
    let (_dir, pool) = create_test_db().await;
    seed_taxon(&pool, "Orobanchaceae", Rank::Family, None).await;
    let stub = stub();

    let summary = pipeline(&pool, &stub, 3)
        .run(&[row("r1", "miniata", None)])
        .await
        .unwrap();
    let manager = BatchManager::new(pool.clone(), 1000);

    manager.undo(&summary.batch_token).await.unwrap();
    let again = manager.undo(&summary.batch_token).await;

    assert!(matches!(again, Err(TaxaError::BatchUnknown(_))));
}

#[tokio::test]
async fn test_later_batch_keeps_shared_ancestors_alive() {
    let (_dir, pool) = create_test_db().await;
    seed_taxon(&pool, "Orobanchaceae", Rank::Family, None).await;
    let stub = stub();

    let first = pipeline(&pool, &stub, 3)
        .run(&[row("r1", "miniata", None)])
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    let second = pipeline(&pool, &stub, 4)
        .run(&[row("r2", "miniata", Some(("var.", "dixonii")))])
        .await
        .unwrap();
    assert_eq!(first.nodes_created, 2);
    assert_eq!(second.nodes_created, 1);

    let manager = BatchManager::new(pool.clone(), 1000);

    // The first batch's species now carries the second batch's variety
    let report = manager.undo(&first.batch_token).await.unwrap();
    assert_eq!(report.total_deleted, 0);
    assert_eq!(taxa::count_taxa(&pool).await.unwrap(), 4);
    assert_no_orphans(&pool).await;

    let report = manager.undo(&second.batch_token).await.unwrap();
    assert_eq!(report.deleted_per_pass, vec![1]);
    assert!(taxa::find_id_by_full_name(&pool, "Castilleja miniata", false, None)
        .await
        .unwrap()
        .is_some());
    assert_no_orphans(&pool).await;
}

#[tokio::test]
async fn test_undo_leaves_same_creator_earlier_batch_untouched() {
    let (_dir, pool) = create_test_db().await;
    seed_taxon(&pool, "Orobanchaceae", Rank::Family, None).await;
    let stub = stub();

    pipeline(&pool, &stub, 3)
        .run(&[row("r1", "miniata", None)])
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    let second = pipeline(&pool, &stub, 3)
        .run(&[row("r2", "miniata", Some(("var.", "dixonii")))])
        .await
        .unwrap();

    let report = BatchManager::new(pool.clone(), 1000)
        .undo(&second.batch_token)
        .await
        .unwrap();

    assert_eq!(report.total_deleted, 1);
    assert_eq!(taxa::count_taxa(&pool).await.unwrap(), 3);
    assert_no_orphans(&pool).await;
}

#[tokio::test]
async fn test_chain_failing_midway_is_recorded_and_undoable() {
    let (_dir, pool) = create_test_db().await;
    seed_taxon(&pool, "Orobanchaceae", Rank::Family, None).await;
    sqlx::query(
        "CREATE TRIGGER refuse_dixonii BEFORE INSERT ON taxa \
         WHEN NEW.full_name = 'Castilleja miniata var. dixonii' \
         BEGIN SELECT RAISE(ABORT, 'refused'); END",
    )
    .execute(&pool)
    .await
    .unwrap();
    let stub = stub();

    let result = pipeline(&pool, &stub, 3)
        .run(&[row("r1", "miniata", Some(("var.", "dixonii")))])
        .await;
    assert!(matches!(result, Err(TaxaError::Common(_))));
    assert_eq!(taxa::count_taxa(&pool).await.unwrap(), 3);

    let token: String = sqlx::query_scalar("SELECT token FROM import_batches")
        .fetch_one(&pool)
        .await
        .unwrap();
    let record = batches::load_batch(&pool, &token).await.unwrap().unwrap();
    assert_eq!(record.size, 2);

    let report = BatchManager::new(pool.clone(), 1000).undo(&token).await.unwrap();
    assert_eq!(report.deleted_per_pass, vec![1, 1]);
    assert_eq!(taxa::count_taxa(&pool).await.unwrap(), 1);
    assert_no_orphans(&pool).await;
}
