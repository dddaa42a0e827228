use docsis_core::error::{CoreError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Opens a `SqlitePool` with WAL mode enabled (concurrent readers alongside
/// a single serialized writer, per SPEC_FULL.md §1) and applies pending
/// migrations.
pub async fn open(database_url: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(opts)
        .await
        .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;

    info!(%database_url, "opened sqlite store, migrations applied");
    Ok(pool)
}
