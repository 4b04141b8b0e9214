//! herb-taxa - Taxonomic tree import and rollback
//!
//! `import` resolves a JSON array of raw name rows against the taxon tree,
//! creating missing nodes, and prints the run summary. `undo` removes the
//! nodes a recorded batch created and prints the undo report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herb_common::config::{load_toml_config, resolve_database_path, resolve_root_folder};
use herb_taxa::config::{build_external_resolver, pipeline_config};
use herb_taxa::models::RawNameRow;
use herb_taxa::services::{BatchManager, ImportPipeline};

/// Command-line arguments for herb-taxa
#[derive(Parser, Debug)]
#[command(name = "herb-taxa")]
#[command(about = "Taxonomic tree resolution and batch rollback for herbarium imports")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve and insert the names in a JSON file of raw name rows
    Import {
        rows: PathBuf,

        /// Agent id stamped on created nodes (overrides `[import] creator_id`)
        #[arg(long)]
        creator: Option<i64>,
    },
    /// Roll back the nodes created by a recorded batch
    Undo { token: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting herb-taxa {}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = resolve_database_path(&root_folder, &toml_config);
    info!("Database: {}", db_path.display());

    let pool = herb_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    match args.command {
        Command::Import { rows, creator } => {
            let content = std::fs::read_to_string(&rows)
                .with_context(|| format!("Failed to read {}", rows.display()))?;
            let parsed: Vec<RawNameRow> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse rows from {}", rows.display()))?;

            let external = build_external_resolver(&pool, &toml_config).await?;
            let pipeline = ImportPipeline::new(pool.clone(), external, pipeline_config(&toml_config, creator));

            let summary = pipeline.run(&parsed).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Undo { token } => {
            let manager = BatchManager::new(pool.clone(), toml_config.import.database_max_lock_wait_ms);
            let report = manager.undo(&token).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    pool.close().await;
    Ok(())
}
