//! Database initialization
//!
//! Creates the taxon tree, batch provenance ledger, review ledger and
//! settings tables. Every statement is idempotent, so opening an existing
//! database runs the same code path as creating a new one.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Short busy timeout; longer waits are handled by retry with backoff
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(250));

    // Tree writes are serialized through one engine per run
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes on an already-open pool
///
/// Also used directly by tests against in-memory databases.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    create_settings_table(pool).await?;
    create_taxa_table(pool).await?;
    create_import_batches_table(pool).await?;
    create_needs_review_table(pool).await?;

    Ok(())
}

pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Taxon tree
///
/// `parent_id` is NULL only for root (family level) nodes. The foreign key
/// makes deleting a node that still has children fail instead of orphaning.
pub async fn create_taxa_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS taxa (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            terminal_name TEXT NOT NULL,
            rank_id INTEGER NOT NULL,
            tree_definition_item_id INTEGER NOT NULL,
            parent_id INTEGER REFERENCES taxa(id),
            author TEXT,
            is_hybrid INTEGER NOT NULL DEFAULT 0,
            is_accepted INTEGER NOT NULL DEFAULT 1,
            guid TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            created_by INTEGER NOT NULL,
            UNIQUE (full_name, is_hybrid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_taxa_parent ON taxa(parent_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_taxa_provenance ON taxa(created_by, created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Batch provenance ledger, one row per completed import run
pub async fn create_import_batches_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_batches (
            token TEXT PRIMARY KEY,
            start_time INTEGER NOT NULL,
            end_time INTEGER NOT NULL,
            creator_id INTEGER NOT NULL,
            size INTEGER NOT NULL DEFAULT 0,
            recorded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Rejected resolution candidates awaiting manual review
pub async fn create_needs_review_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS needs_review (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_token TEXT NOT NULL,
            row_id TEXT NOT NULL,
            submitted_name TEXT NOT NULL,
            matched_name TEXT,
            confidence REAL NOT NULL,
            reason TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_needs_review_batch ON needs_review(batch_token)")
        .execute(pool)
        .await?;

    Ok(())
}
