//! Database test utilities

use herb_taxa::db::taxa;
use herb_taxa::models::{NewTaxon, TaxonId};
use herb_taxa::names::Rank;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create an on-disk test database with the full schema
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_herbarium.db");
    let pool = herb_common::db::init_database(&db_path).await.unwrap();
    (temp_dir, pool)
}

/// Insert a pre-existing node (creator 0, outside any import batch)
pub async fn seed_taxon(pool: &SqlitePool, full_name: &str, rank: Rank, parent_id: Option<TaxonId>) -> TaxonId {
    let terminal = full_name.rsplit(' ').next().unwrap_or(full_name);
    let taxon = NewTaxon {
        full_name: full_name.to_string(),
        terminal_name: terminal.to_string(),
        rank,
        parent_id,
        author: None,
        is_hybrid: false,
        created_by: 0,
    };
    taxa::insert_taxon(pool, &taxon, 1000).await.unwrap().0
}

pub async fn assert_no_orphans(pool: &SqlitePool) {
    let orphans = taxa::find_orphans(pool).await.unwrap();
    assert!(orphans.is_empty(), "Orphaned nodes: {:?}", orphans);
}
