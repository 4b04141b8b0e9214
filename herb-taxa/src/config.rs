//! Configuration resolution for herb-taxa
//!
//! The resolver service URL is resolved with Database → ENV → TOML priority.
//! An unset URL is not an error here: the import pipeline only fails if a run
//! actually needs the external service.

use herb_common::config::TomlConfig;
use herb_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::services::{ExternalResolver, HttpNameMatchService, PipelineConfig};

/// Environment variable overriding the resolver URL
pub const RESOLVER_URL_ENV: &str = "HERB_RESOLVER_URL";

/// Resolve the name resolution service URL
///
/// **Priority:** Database → ENV → TOML
pub async fn resolve_resolver_url(db: &SqlitePool, toml_config: &TomlConfig) -> Result<Option<String>> {
    let db_url = crate::db::settings::get_resolver_url(db).await?;
    let env_url = std::env::var(RESOLVER_URL_ENV)
        .ok()
        .filter(|u| is_valid_url(u));
    let toml_url = toml_config
        .resolver
        .base_url
        .clone()
        .filter(|u| is_valid_url(u));

    let sources: Vec<&str> = [
        (db_url.is_some(), "database"),
        (env_url.is_some(), "environment"),
        (toml_url.is_some(), "TOML"),
    ]
    .iter()
    .filter(|(present, _)| *present)
    .map(|(_, name)| *name)
    .collect();

    if sources.len() > 1 {
        let distinct: std::collections::HashSet<&String> =
            [&db_url, &env_url, &toml_url].into_iter().flatten().collect();
        if distinct.len() > 1 {
            warn!(
                "Resolver URL found in multiple sources with different values: {}. Using {} (highest priority).",
                sources.join(", "),
                sources[0]
            );
        }
    }

    if let Some(url) = db_url {
        info!("Resolver URL loaded from database");
        return Ok(Some(url));
    }
    if let Some(url) = env_url {
        info!("Resolver URL loaded from environment variable");
        return Ok(Some(url));
    }
    if let Some(url) = toml_url {
        info!("Resolver URL loaded from TOML config");
        return Ok(Some(url));
    }

    warn!("Resolver URL not configured; names missing from the local tree cannot be resolved");
    Ok(None)
}

/// Non-empty, non-whitespace
pub fn is_valid_url(url: &str) -> bool {
    !url.trim().is_empty()
}

/// Build the external resolver from the resolved URL, if any
pub async fn build_external_resolver(
    db: &SqlitePool,
    toml_config: &TomlConfig,
) -> Result<Option<ExternalResolver>> {
    let url = match resolve_resolver_url(db, toml_config).await? {
        Some(url) => url,
        None => return Ok(None),
    };

    let service = HttpNameMatchService::new(url, toml_config.resolver.timeout_secs)
        .map_err(|e| Error::Config(format!("Resolver client setup failed: {}", e)))?;

    Ok(Some(ExternalResolver::new(
        Arc::new(service),
        toml_config.resolver.max_retry_wait_ms,
    )))
}

/// Pipeline settings from the `[import]` section, with an optional creator override
pub fn pipeline_config(toml_config: &TomlConfig, creator_override: Option<i64>) -> PipelineConfig {
    PipelineConfig {
        creator_id: creator_override.unwrap_or(toml_config.import.creator_id),
        batch_window_buffer_ms: toml_config.import.batch_window_buffer_ms,
        max_lock_wait_ms: toml_config.import.database_max_lock_wait_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_url() {
        assert!(is_valid_url("http://localhost:9000"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("   "));
    }

    #[test]
    fn test_pipeline_config_override() {
        let toml_config = TomlConfig::default();
        assert_eq!(pipeline_config(&toml_config, None).creator_id, 1);
        assert_eq!(pipeline_config(&toml_config, Some(42)).creator_id, 42);
        assert_eq!(pipeline_config(&toml_config, None).max_lock_wait_ms, 5_000);
    }
}
