//! Settings database operations
//!
//! Key-value accessors over the `settings` table.

use herb_common::{Error, Result};
use sqlx::SqlitePool;

use crate::utils::retry_on_lock;

/// Settings key holding the name resolution service URL
pub const RESOLVER_URL_KEY: &str = "resolver_base_url";

pub async fn get_resolver_url(db: &SqlitePool) -> Result<Option<String>> {
    get_setting::<String>(db, RESOLVER_URL_KEY)
        .await
        .map(|url| url.filter(|u| !u.trim().is_empty()))
}

pub async fn set_resolver_url(db: &SqlitePool, url: String, max_wait_ms: u64) -> Result<()> {
    set_setting(db, RESOLVER_URL_KEY, url, max_wait_ms).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter
pub async fn set_setting<T>(db: &SqlitePool, key: &str, value: T, max_wait_ms: u64) -> Result<()>
where
    T: std::fmt::Display,
{
    let value = value.to_string();

    retry_on_lock("set setting", max_wait_ms, || async {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(&value)
        .execute(db)
        .await?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        herb_common::db::init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_resolver_url_round_trip() {
        let pool = setup_test_db().await;
        assert_eq!(get_resolver_url(&pool).await.unwrap(), None);

        set_resolver_url(&pool, "http://resolver.local".to_string(), 1000).await.unwrap();
        assert_eq!(
            get_resolver_url(&pool).await.unwrap().as_deref(),
            Some("http://resolver.local")
        );

        set_resolver_url(&pool, "http://other.local".to_string(), 1000).await.unwrap();
        assert_eq!(
            get_resolver_url(&pool).await.unwrap().as_deref(),
            Some("http://other.local")
        );
    }

    #[tokio::test]
    async fn test_blank_resolver_url_treated_as_unset() {
        let pool = setup_test_db().await;
        set_resolver_url(&pool, "   ".to_string(), 1000).await.unwrap();
        assert_eq!(get_resolver_url(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unparseable_setting_is_config_error() {
        let pool = setup_test_db().await;
        set_setting(&pool, "window", "abc", 1000).await.unwrap();
        let result = get_setting::<u64>(&pool, "window").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_set_setting_waits_out_held_write_lock() {
        let dir = tempfile::TempDir::new().unwrap();
        let pool = herb_common::db::init_database(&dir.path().join("settings.db"))
            .await
            .unwrap();

        // Hold the write lock well past the connection busy timeout
        let mut holder = pool.acquire().await.unwrap();
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *holder).await.unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(600)).await;
            sqlx::query("COMMIT").execute(&mut *holder).await.unwrap();
        });

        set_setting(&pool, "window", 30, 5000).await.unwrap();
        release.await.unwrap();

        assert_eq!(get_setting::<u64>(&pool, "window").await.unwrap(), Some(30));
    }
}
