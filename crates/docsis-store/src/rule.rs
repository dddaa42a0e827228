use async_trait::async_trait;
use docsis_core::error::{CoreError, Result};
use docsis_core::ports::RuleStore;
use docsis_core::types::{Id, Rule, RuleInput};
use tracing::debug;

use crate::retry::{map_err, with_busy_retry};
use crate::rows::RuleRow;
use crate::time::now_unix;
use crate::SqliteStore;

#[async_trait]
impl RuleStore for SqliteStore {
    async fn create_rule(&self, input: RuleInput) -> Result<Rule> {
        input.validate()?;
        let criteria_json = serde_json::to_string(&input.criteria)
            .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
        let now = now_unix();

        let id = with_busy_retry(|| {
            sqlx::query(
                "INSERT INTO rules (name, description, match_criteria, tftp_server_ip, \
                 firmware_filename, enabled, priority, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(&input.description)
            .bind(&criteria_json)
            .bind(&input.tftp_server_ip)
            .bind(&input.firmware_filename)
            .bind(input.enabled)
            .bind(input.priority)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
        })
        .await?
        .last_insert_rowid();

        debug!(rule_id = id, "created rule");
        self.get_rule(id).await
    }

    async fn update_rule(&self, id: Id, input: RuleInput) -> Result<Rule> {
        input.validate()?;
        let criteria_json = serde_json::to_string(&input.criteria)
            .map_err(|e| CoreError::Internal(anyhow::anyhow!(e)))?;
        let now = now_unix();

        let rows = with_busy_retry(|| {
            sqlx::query(
                "UPDATE rules SET name = ?, description = ?, match_criteria = ?, \
                 tftp_server_ip = ?, firmware_filename = ?, enabled = ?, priority = ?, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(&input.name)
            .bind(&input.description)
            .bind(&criteria_json)
            .bind(&input.tftp_server_ip)
            .bind(&input.firmware_filename)
            .bind(input.enabled)
            .bind(input.priority)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(CoreError::NotFound(format!("rule {id} not found")));
        }
        self.get_rule(id).await
    }

    async fn delete_rule(&self, id: Id) -> Result<()> {
        let rows = with_busy_retry(|| {
            sqlx::query("DELETE FROM rules WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(CoreError::NotFound(format!("rule {id} not found")));
        }
        Ok(())
    }

    async fn get_rule(&self, id: Id) -> Result<Rule> {
        let row: RuleRow = sqlx::query_as("SELECT * FROM rules WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        row.try_into()
    }

    async fn list_rules(&self) -> Result<Vec<Rule>> {
        let rows: Vec<RuleRow> =
            sqlx::query_as("SELECT * FROM rules ORDER BY priority DESC, name ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        rows.into_iter().map(Rule::try_from).collect()
    }

    async fn list_enabled_rules(&self) -> Result<Vec<Rule>> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            "SELECT * FROM rules WHERE enabled = 1 ORDER BY priority DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows.into_iter().map(Rule::try_from).collect()
    }
}
