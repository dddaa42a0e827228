use std::future::Future;
use std::time::Duration;

use docsis_core::error::CoreError;
use sqlx::error::ErrorKind;
use tracing::warn;

const BUSY_DELAYS_MS: [u64; 3] = [10, 40, 160];

/// Retries a write against SQLite's single-writer lock. `SQLITE_BUSY`
/// surfaces as `sqlx::Error::Database` with code `"5"`; after the retry
/// budget is exhausted the caller gets `CoreError::Transient` rather than a
/// raw sqlx error.
pub(crate) async fn with_busy_retry<T, F, Fut>(mut f: F) -> docsis_core::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut attempt = 0usize;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if is_busy(&e) && attempt < BUSY_DELAYS_MS.len() => {
                warn!(attempt, "sqlite busy, retrying write");
                tokio::time::sleep(Duration::from_millis(BUSY_DELAYS_MS[attempt])).await;
                attempt += 1;
            }
            Err(e) if is_busy(&e) => {
                return Err(CoreError::Transient(format!(
                    "sqlite busy after {} retries: {e}",
                    BUSY_DELAYS_MS.len()
                )));
            }
            Err(e) => return Err(map_err(e)),
        }
    }
}

fn is_busy(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("5"))
}

pub(crate) fn map_err(e: sqlx::Error) -> CoreError {
    match &e {
        sqlx::Error::RowNotFound => CoreError::NotFound("row not found".to_string()),
        sqlx::Error::Database(db) if db.kind() == ErrorKind::UniqueViolation => {
            CoreError::Conflict(db.message().to_string())
        }
        _ => CoreError::Internal(anyhow::anyhow!(e)),
    }
}
