use async_trait::async_trait;
use docsis_core::error::{CoreError, Result};
use docsis_core::ports::JobStore;
use docsis_core::types::{Id, Job, JobFilter, JobStatus, NewJob};
use tracing::debug;

use crate::retry::{map_err, with_busy_retry};
use crate::rows::JobRow;
use crate::time::now_unix;
use crate::SqliteStore;

const DEFAULT_JOB_LIMIT: i64 = 100;

#[async_trait]
impl JobStore for SqliteStore {
    async fn create_job(&self, job: NewJob) -> Result<Job> {
        let now = now_unix();
        let id = with_busy_retry(|| {
            sqlx::query(
                "INSERT INTO jobs (modem_id, rule_id, cmts_id, mac_address, status, \
                 tftp_server_ip, firmware_filename, retry_count, max_retries, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, 'PENDING', ?, ?, 0, ?, ?, ?)",
            )
            .bind(job.modem_id)
            .bind(job.rule_id)
            .bind(job.cmts_id)
            .bind(&job.mac_address)
            .bind(&job.tftp_server_ip)
            .bind(&job.firmware_filename)
            .bind(job.max_retries)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
        })
        .await?
        .last_insert_rowid();

        debug!(job_id = id, modem_id = job.modem_id, "created upgrade job");
        self.get_job(id).await
    }

    async fn get_job(&self, id: Id) -> Result<Job> {
        let row: JobRow = sqlx::query_as("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        row.try_into()
    }

    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>> {
        let limit = filter.limit.unwrap_or(DEFAULT_JOB_LIMIT);
        let rows: Vec<JobRow> = match filter.status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT * FROM jobs WHERE status = ? ORDER BY created_at DESC LIMIT ?",
                )
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as("SELECT * FROM jobs ORDER BY created_at DESC LIMIT ?")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(map_err)?;
        rows.into_iter().map(Job::try_from).collect()
    }

    async fn has_active_job_for_modem(&self, modem_id: Id) -> Result<bool> {
        let exists: (i64,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM jobs WHERE modem_id = ? AND status IN ('PENDING', 'IN_PROGRESS'))",
        )
        .bind(modem_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(exists.0 != 0)
    }

    async fn claim_pending_jobs(&self, limit: i64, now: i64) -> Result<Vec<Job>> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        // Excludes any MAC that already has an IN_PROGRESS job — the second
        // line of defense against the narrow rule-evaluation race called out
        // in spec.md §5, on top of the HashSet dedup below for duplicate
        // PENDING rows created for the same MAC within this same batch.
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, mac_address FROM jobs WHERE status = 'PENDING' \
             AND (retry_after IS NULL OR retry_after <= ?) \
             AND mac_address NOT IN (SELECT mac_address FROM jobs WHERE status = 'IN_PROGRESS') \
             ORDER BY created_at ASC LIMIT ?",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_err)?;

        let mut claimed = Vec::with_capacity(rows.len());
        let mut claimed_macs = std::collections::HashSet::new();
        for (id, mac) in rows {
            if !claimed_macs.insert(mac) {
                continue;
            }
            let row: JobRow = sqlx::query_as(
                "UPDATE jobs SET status = 'IN_PROGRESS', started_at = ?, updated_at = ? \
                 WHERE id = ? RETURNING *",
            )
            .bind(now)
            .bind(now)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_err)?;
            claimed.push(Job::try_from(row)?);
        }

        tx.commit().await.map_err(map_err)?;
        debug!(count = claimed.len(), "claimed pending jobs");
        Ok(claimed)
    }

    async fn mark_completed(&self, id: Id, now: i64) -> Result<Job> {
        let rows = with_busy_retry(|| {
            sqlx::query(
                "UPDATE jobs SET status = 'COMPLETED', completed_at = ?, error_message = NULL, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(CoreError::NotFound(format!("job {id} not found")));
        }
        debug!(job_id = id, "job completed");
        self.get_job(id).await
    }

    async fn record_failure(
        &self,
        id: Id,
        error_message: &str,
        retry_after: Option<i64>,
        now: i64,
    ) -> Result<Job> {
        let rows = with_busy_retry(|| {
            sqlx::query(
                "UPDATE jobs SET \
                   retry_count = retry_count + 1, \
                   error_message = ?, \
                   status = CASE WHEN retry_count + 1 > max_retries THEN 'FAILED' ELSE 'PENDING' END, \
                   retry_after = CASE WHEN retry_count + 1 > max_retries THEN NULL ELSE ? END, \
                   completed_at = CASE WHEN retry_count + 1 > max_retries THEN ? ELSE NULL END, \
                   started_at = CASE WHEN retry_count + 1 > max_retries THEN started_at ELSE NULL END, \
                   updated_at = ? \
                 WHERE id = ?",
            )
            .bind(error_message)
            .bind(retry_after)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(CoreError::NotFound(format!("job {id} not found")));
        }
        let job = self.get_job(id).await?;
        debug!(job_id = id, status = job.status.as_str(), retry_count = job.retry_count, "recorded job failure");
        Ok(job)
    }

    async fn retry_job(&self, id: Id, now: i64) -> Result<Job> {
        let rows = with_busy_retry(|| {
            sqlx::query(
                "UPDATE jobs SET status = 'PENDING', retry_count = 0, retry_after = NULL, \
                 started_at = NULL, completed_at = NULL, error_message = NULL, updated_at = ? \
                 WHERE id = ? AND status = 'FAILED'",
            )
            .bind(now)
            .bind(id)
            .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows == 0 {
            // Either the job doesn't exist, or it exists but isn't FAILED
            // (e.g. currently IN_PROGRESS) — resolve which so a manual retry
            // against a running job can't silently reset it to PENDING.
            let job = self.get_job(id).await?;
            return Err(CoreError::Validation(format!(
                "job {id} is {} and cannot be retried; only FAILED jobs can be retried",
                job.status.as_str()
            )));
        }
        self.get_job(id).await
    }

    async fn requeue_orphaned(&self, timeout_secs: i64, now: i64) -> Result<u64> {
        let cutoff = now - timeout_secs;
        let rows = with_busy_retry(|| {
            sqlx::query(
                "UPDATE jobs SET status = 'PENDING', retry_after = NULL, updated_at = ? \
                 WHERE status = 'IN_PROGRESS' AND started_at IS NOT NULL AND started_at < ?",
            )
            .bind(now)
            .bind(cutoff)
            .execute(&self.pool)
        })
        .await?
        .rows_affected();

        if rows > 0 {
            debug!(count = rows, "requeued orphaned in-progress jobs on startup sweep");
        }
        Ok(rows)
    }

    async fn count_jobs_by_status(&self) -> Result<Vec<(JobStatus, i64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) as count FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        rows.into_iter()
            .map(|(status, count)| Ok((status.parse::<JobStatus>()?, count)))
            .collect()
    }
}
