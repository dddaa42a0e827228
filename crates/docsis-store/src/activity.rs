use async_trait::async_trait;
use docsis_core::error::{CoreError, Result};
use docsis_core::ports::ActivityStore;
use docsis_core::types::{ActivityEvent, NewActivityEvent};
use tracing::warn;

use crate::rows::ActivityEventRow;
use crate::time::now_unix;
use crate::SqliteStore;

#[async_trait]
impl ActivityStore for SqliteStore {
    async fn record(&self, event: NewActivityEvent) -> Result<ActivityEvent> {
        let now = now_unix();
        let details_json = match &event.details {
            Some(v) => Some(
                serde_json::to_string(v).map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?,
            ),
            None => None,
        };

        let result = sqlx::query(
            "INSERT INTO activity_events (event_type, entity_type, entity_id, message, details, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(event.event_type.as_str())
        .bind(&event.entity_type)
        .bind(event.entity_id)
        .bind(&event.message)
        .bind(&details_json)
        .bind(now)
        .execute(&self.pool)
        .await;

        // Best-effort per SPEC_FULL.md §4.8: a failed audit write is logged
        // and swallowed, never propagated to the caller's operation.
        match result {
            Ok(res) => {
                let row: ActivityEventRow =
                    sqlx::query_as("SELECT * FROM activity_events WHERE id = ?")
                        .bind(res.last_insert_rowid())
                        .fetch_one(&self.pool)
                        .await
                        .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
                row.try_into()
            }
            Err(e) => {
                warn!(error = %e, event_type = event.event_type.as_str(), "failed to record activity event");
                Ok(ActivityEvent {
                    id: 0,
                    event_type: event.event_type.as_str().to_string(),
                    entity_type: event.entity_type,
                    entity_id: event.entity_id,
                    message: event.message,
                    details: event.details,
                    created_at: now,
                })
            }
        }
    }

    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityEvent>> {
        let rows: Vec<ActivityEventRow> =
            sqlx::query_as("SELECT * FROM activity_events ORDER BY created_at DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
        rows.into_iter().map(ActivityEvent::try_from).collect()
    }

    async fn count_activity(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_events")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
        Ok(count)
    }
}
