//! Taxon tree store operations
//!
//! The tree is only ever mutated by insert (import) and leaf delete (undo).

use herb_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::models::{NewTaxon, TaxonId, TaxonNode};
use crate::utils::retry_on_lock;

const TAXON_COLUMNS: &str = "id, full_name, terminal_name, rank_id, tree_definition_item_id, \
     parent_id, author, is_hybrid, is_accepted, guid, created_at, created_by";

fn taxon_from_row(row: &SqliteRow) -> Result<TaxonNode> {
    let guid: String = row.get("guid");
    Ok(TaxonNode {
        id: row.get("id"),
        full_name: row.get("full_name"),
        terminal_name: row.get("terminal_name"),
        rank_id: row.get("rank_id"),
        tree_definition_item_id: row.get("tree_definition_item_id"),
        parent_id: row.get("parent_id"),
        author: row.get("author"),
        is_hybrid: row.get("is_hybrid"),
        is_accepted: row.get("is_accepted"),
        guid: Uuid::parse_str(&guid)
            .map_err(|e| Error::Internal(format!("Invalid taxon guid '{}': {}", guid, e)))?,
        created_at: time::from_millis(row.get("created_at")),
        created_by: row.get("created_by"),
    })
}

/// Exact, case-sensitive lookup by full name within one hybrid partition
///
/// `terminal_hint`, when given, must also match the node's terminal name.
pub async fn find_id_by_full_name(
    pool: &SqlitePool,
    full_name: &str,
    is_hybrid: bool,
    terminal_hint: Option<&str>,
) -> Result<Option<TaxonId>> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM taxa
        WHERE full_name = ? AND is_hybrid = ?
          AND (? IS NULL OR terminal_name = ?)
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(full_name)
    .bind(is_hybrid)
    .bind(terminal_hint)
    .bind(terminal_hint)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Hybrid nodes whose full name starts with `base` followed by a space
///
/// Shortest names first, so the tightest formula wins among matches.
pub async fn find_hybrid_candidates(
    pool: &SqlitePool,
    base: &str,
) -> Result<Vec<(TaxonId, String)>> {
    let prefix = format!("{} ", base);
    let rows: Vec<(i64, String)> = sqlx::query_as(
        r#"
        SELECT id, full_name FROM taxa
        WHERE is_hybrid = 1 AND substr(full_name, 1, length(?)) = ?
        ORDER BY length(full_name), id
        "#,
    )
    .bind(&prefix)
    .bind(&prefix)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn load_taxon(pool: &SqlitePool, id: TaxonId) -> Result<Option<TaxonNode>> {
    let query = format!("SELECT {} FROM taxa WHERE id = ?", TAXON_COLUMNS);
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;

    row.as_ref().map(taxon_from_row).transpose()
}

/// Insert a taxon node
///
/// Returns the node id and whether this call created it. A node with the same
/// name and hybrid flag that appeared since the caller's last check is reused
/// rather than reported as a conflict.
pub async fn insert_taxon(
    pool: &SqlitePool,
    taxon: &NewTaxon,
    max_wait_ms: u64,
) -> Result<(TaxonId, bool)> {
    // Prepare all data before acquiring a connection
    let guid = Uuid::new_v4().to_string();
    let rank_id = taxon.rank.rank_id();
    let tree_definition_item_id = taxon.rank.tree_definition_item_id();

    retry_on_lock("insert taxon", max_wait_ms, || async {
        let result = sqlx::query(
            r#"
            INSERT INTO taxa (
                full_name, terminal_name, rank_id, tree_definition_item_id, parent_id,
                author, is_hybrid, is_accepted, guid, created_at, created_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
            ON CONFLICT(full_name, is_hybrid) DO NOTHING
            "#,
        )
        .bind(&taxon.full_name)
        .bind(&taxon.terminal_name)
        .bind(rank_id)
        .bind(tree_definition_item_id)
        .bind(taxon.parent_id)
        .bind(&taxon.author)
        .bind(taxon.is_hybrid)
        .bind(&guid)
        .bind(time::now_millis())
        .bind(taxon.created_by)
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok((result.last_insert_rowid(), true));
        }

        let existing: i64 =
            sqlx::query_scalar("SELECT id FROM taxa WHERE full_name = ? AND is_hybrid = ?")
                .bind(&taxon.full_name)
                .bind(taxon.is_hybrid)
                .fetch_one(pool)
                .await?;
        Ok((existing, false))
    })
    .await
}

/// Delete the current leaves stamped with `creator_id` inside `[start_ms, end_ms]`
///
/// One statement, so a child inserted by another process between selection
/// and deletion cannot be orphaned. Returns the names of deleted nodes.
pub async fn delete_leaves_in_window(
    pool: &SqlitePool,
    creator_id: i64,
    start_ms: i64,
    end_ms: i64,
    max_wait_ms: u64,
) -> Result<Vec<String>> {
    retry_on_lock("delete batch leaves", max_wait_ms, || async {
        let deleted: Vec<String> = sqlx::query_scalar(
            r#"
            DELETE FROM taxa
            WHERE created_by = ?
              AND created_at BETWEEN ? AND ?
              AND NOT EXISTS (SELECT 1 FROM taxa AS child WHERE child.parent_id = taxa.id)
            RETURNING full_name
            "#,
        )
        .bind(creator_id)
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(pool)
        .await?;
        Ok(deleted)
    })
    .await
}

/// Nodes whose parent id points at a node that no longer exists
pub async fn find_orphans(pool: &SqlitePool) -> Result<Vec<TaxonId>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT child.id FROM taxa AS child
        LEFT JOIN taxa AS parent ON child.parent_id = parent.id
        WHERE child.parent_id IS NOT NULL AND parent.id IS NULL
        ORDER BY child.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

pub async fn count_taxa(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM taxa")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
