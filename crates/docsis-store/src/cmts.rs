use async_trait::async_trait;
use docsis_core::error::{CoreError, Result};
use docsis_core::ports::CmtsStore;
use docsis_core::types::{Cmts, CmtsInput, Id};
use tracing::debug;

use crate::retry::{map_err, with_busy_retry};
use crate::rows::CmtsRow;
use crate::SqliteStore;

#[async_trait]
impl CmtsStore for SqliteStore {
    async fn create_cmts(&self, input: CmtsInput) -> Result<Cmts> {
        input.validate()?;
        let now = crate::time::now_unix();
        let id = with_busy_retry(|| {
            sqlx::query(
                "INSERT INTO cmts (name, ip_address, snmp_port, community_read, community_write, \
                 cm_community_string, snmp_version, enabled, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(&input.ip_address)
            .bind(input.snmp_port as i64)
            .bind(&input.community_read)
            .bind(&input.community_write)
            .bind(&input.cm_community_string)
            .bind(input.snmp_version.as_str())
            .bind(input.enabled)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
        })
        .await?
        .last_insert_rowid();

        debug!(cmts_id = id, "created cmts");
        self.get_cmts(id).await
    }

    async fn update_cmts(&self, id: Id, input: CmtsInput) -> Result<Cmts> {
        input.validate()?;
        let now = crate::time::now_unix();
        let rows = with_busy_retry(|| {
            sqlx::query(
                "UPDATE cmts SET name = ?, ip_address = ?, snmp_port = ?, community_read = ?, \
                 community_write = ?, cm_community_string = ?, snmp_version = ?, enabled = ?, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(&input.name)
            .bind(&input.ip_address)
            .bind(input.snmp_port as i64)
            .bind(&input.community_read)
            .bind(&input.community_write)
            .bind(&input.cm_community_string)
            .bind(input.snmp_version.as_str())
            .bind(input.enabled)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(CoreError::NotFound(format!("cmts {id} not found")));
        }
        self.get_cmts(id).await
    }

    async fn delete_cmts(&self, id: Id) -> Result<()> {
        let rows = with_busy_retry(|| {
            sqlx::query("DELETE FROM cmts WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(CoreError::NotFound(format!("cmts {id} not found")));
        }
        Ok(())
    }

    async fn get_cmts(&self, id: Id) -> Result<Cmts> {
        let row: CmtsRow = sqlx::query_as("SELECT * FROM cmts WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        row.try_into()
    }

    async fn list_cmts(&self) -> Result<Vec<Cmts>> {
        let rows: Vec<CmtsRow> = sqlx::query_as("SELECT * FROM cmts ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter().map(Cmts::try_from).collect()
    }

    async fn list_enabled_cmts(&self) -> Result<Vec<Cmts>> {
        let rows: Vec<CmtsRow> =
            sqlx::query_as("SELECT * FROM cmts WHERE enabled = 1 ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        rows.into_iter().map(Cmts::try_from).collect()
    }
}
