use async_trait::async_trait;
use docsis_core::error::Result;
use docsis_core::ports::ModemStore;
use docsis_core::types::{Id, Modem, ModemFilter, ModemUpsert};
use tracing::debug;

use crate::retry::{map_err, with_busy_retry};
use crate::rows::ModemRow;
use crate::time::now_unix;
use crate::SqliteStore;

#[async_trait]
impl ModemStore for SqliteStore {
    async fn upsert_modem(&self, modem: ModemUpsert) -> Result<Modem> {
        let now = now_unix();
        with_busy_retry(|| {
            sqlx::query(
                "INSERT INTO modems (cmts_id, mac_address, ip_address, sys_descr, \
                 current_firmware, signal_level, status, last_seen, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT (mac_address) DO UPDATE SET \
                 cmts_id = excluded.cmts_id, \
                 ip_address = excluded.ip_address, \
                 sys_descr = excluded.sys_descr, \
                 current_firmware = excluded.current_firmware, \
                 signal_level = excluded.signal_level, \
                 status = excluded.status, \
                 last_seen = excluded.last_seen, \
                 updated_at = excluded.updated_at",
            )
            .bind(modem.cmts_id)
            .bind(&modem.mac_address)
            .bind(&modem.ip_address)
            .bind(&modem.sys_descr)
            .bind(&modem.current_firmware)
            .bind(modem.signal_level)
            .bind(modem.status.as_str())
            .bind(now)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
        })
        .await?;

        let row: ModemRow = sqlx::query_as("SELECT * FROM modems WHERE mac_address = ?")
            .bind(&modem.mac_address)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        debug!(cmts_id = modem.cmts_id, mac = %modem.mac_address, "upserted modem");
        row.try_into()
    }

    async fn get_modem(&self, id: Id) -> Result<Modem> {
        let row: ModemRow = sqlx::query_as("SELECT * FROM modems WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        row.try_into()
    }

    async fn find_modem_by_mac(&self, mac_address: &str) -> Result<Option<Modem>> {
        let row: Option<ModemRow> = sqlx::query_as("SELECT * FROM modems WHERE mac_address = ?")
            .bind(mac_address)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(Modem::try_from).transpose()
    }

    async fn list_modems(&self, filter: ModemFilter) -> Result<Vec<Modem>> {
        let rows: Vec<ModemRow> = match filter.cmts_id {
            Some(cmts_id) => {
                sqlx::query_as("SELECT * FROM modems WHERE cmts_id = ? ORDER BY last_seen DESC")
                    .bind(cmts_id)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as("SELECT * FROM modems ORDER BY last_seen DESC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(map_err)?;
        rows.into_iter().map(Modem::try_from).collect()
    }

    async fn cleanup_stale_modems(
        &self,
        offline_after_minutes: i64,
        delete_after_days: i64,
        now: i64,
    ) -> Result<(u64, u64)> {
        let offline_cutoff = now - offline_after_minutes * 60;
        let delete_cutoff = now - delete_after_days * 24 * 3600;

        let marked = with_busy_retry(|| {
            sqlx::query(
                "UPDATE modems SET status = 'OFFLINE', updated_at = ? \
                 WHERE status != 'OFFLINE' AND last_seen < ?",
            )
            .bind(now)
            .bind(offline_cutoff)
            .execute(&self.pool)
        })
        .await?;

        let deleted = with_busy_retry(|| {
            sqlx::query("DELETE FROM modems WHERE status = 'OFFLINE' AND last_seen < ?")
                .bind(delete_cutoff)
                .execute(&self.pool)
        })
        .await?;

        let marked_count = marked.rows_affected();
        let deleted_count = deleted.rows_affected();
        debug!(marked_count, deleted_count, "cleaned up stale modems");
        Ok((marked_count, deleted_count))
    }
}
