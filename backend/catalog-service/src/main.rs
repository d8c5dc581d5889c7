/// Species Loader Entry Point
///
/// Bulk-ingests the upstream species dataset:
/// - PostgreSQL connection pool (+ lazy schema creation)
/// - one transaction per record file
/// - created/skipped/failed counters on exit
use anyhow::{Context, Result};
use catalog_service::{config::Settings, db, ingest};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "catalog_service=info,info".into()),
        )
        .with_target(false)
        .init();

    let settings = Settings::load()?;

    let data_dir: PathBuf = std::env::args()
        .nth(1)
        .context("Usage: species-loader <data-dir>")?
        .into();

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    db::schema::ensure_schema(&pool)
        .await
        .context("Failed to ensure catalog schema")?;

    info!(data_dir = %data_dir.display(), "Starting species ingestion");
    let stats = ingest::load_directory(&pool, &data_dir)
        .await
        .context("Species ingestion failed")?;

    info!(
        created = stats.created,
        skipped = stats.skipped,
        failed = stats.failed,
        "Species ingestion finished"
    );

    Ok(())
}
