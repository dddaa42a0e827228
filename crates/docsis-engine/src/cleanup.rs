use std::sync::Arc;

use docsis_core::clock::now_unix;
use docsis_core::error::Result;
use docsis_core::ports::Store;
use docsis_core::types::{EventType, NewActivityEvent};
use tracing::info;

/// Marks modems unseen for `offline_after_minutes` as `OFFLINE`, then
/// deletes modems that have been `OFFLINE` for more than `delete_after_days`
/// (spec.md §3, §4.7). Emits one `MODEM_CLEANUP` event summarizing both
/// counts whenever either is non-zero.
pub struct CleanupSweeper {
    store: Arc<dyn Store>,
    offline_after_minutes: i64,
    delete_after_days: i64,
}

impl CleanupSweeper {
    pub fn new(store: Arc<dyn Store>, offline_after_minutes: i64, delete_after_days: i64) -> Self {
        Self {
            store,
            offline_after_minutes,
            delete_after_days,
        }
    }

    /// Returns `(marked_offline_count, deleted_count)`.
    pub async fn run_once(&self) -> Result<(u64, u64)> {
        let now = now_unix();
        let (marked, deleted) = self
            .store
            .cleanup_stale_modems(self.offline_after_minutes, self.delete_after_days, now)
            .await?;

        if marked > 0 || deleted > 0 {
            let _ = self
                .store
                .record(NewActivityEvent {
                    event_type: EventType::ModemCleanup,
                    entity_type: "system".to_string(),
                    entity_id: None,
                    message: format!(
                        "cleanup sweep marked {marked} modems offline and deleted {deleted} stale modems"
                    ),
                    details: None,
                })
                .await;
            info!(marked, deleted, "cleanup sweep complete");
        }

        Ok((marked, deleted))
    }
}
