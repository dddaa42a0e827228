use async_trait::async_trait;
use docsis_core::error::Result;
use docsis_core::ports::SettingsStore;
use docsis_core::types::Setting;

use crate::retry::{map_err, with_busy_retry};
use crate::rows::SettingRow;
use crate::SqliteStore;

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get_setting(&self, key: &str) -> Result<Option<Setting>> {
        let row: Option<SettingRow> = sqlx::query_as("SELECT * FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.map(Setting::from))
    }

    async fn set_setting(&self, key: &str, value: &str, now: i64) -> Result<Setting> {
        with_busy_retry(|| {
            sqlx::query(
                "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?) \
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&self.pool)
        })
        .await?;

        Ok(Setting {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: now,
        })
    }

    async fn list_settings(&self) -> Result<Vec<Setting>> {
        let rows: Vec<SettingRow> = sqlx::query_as("SELECT * FROM settings ORDER BY key ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(rows.into_iter().map(Setting::from).collect())
    }
}
