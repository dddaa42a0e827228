use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ActivityEvent, Cmts, CmtsInput, Id, Job, JobFilter, JobStatus, Modem, ModemFilter, ModemUpsert,
    NewActivityEvent, NewJob, Rule, RuleInput, Setting,
};

/// Port for the CMTS inventory. Implemented by `docsis-store`.
#[async_trait]
pub trait CmtsStore: Send + Sync {
    async fn create_cmts(&self, input: CmtsInput) -> Result<Cmts>;
    async fn update_cmts(&self, id: Id, input: CmtsInput) -> Result<Cmts>;
    async fn delete_cmts(&self, id: Id) -> Result<()>;
    async fn get_cmts(&self, id: Id) -> Result<Cmts>;
    /// Ordered by name, per spec.md §3.
    async fn list_cmts(&self) -> Result<Vec<Cmts>>;
    async fn list_enabled_cmts(&self) -> Result<Vec<Cmts>>;
}

/// Port for discovered-modem state. Implemented by `docsis-store`.
#[async_trait]
pub trait ModemStore: Send + Sync {
    /// Insert-or-update keyed on `mac_address` alone, independent of
    /// `cmts_id` — a modem that reappears behind a different CMTS updates
    /// the existing row instead of creating a duplicate.
    async fn upsert_modem(&self, modem: ModemUpsert) -> Result<Modem>;
    async fn get_modem(&self, id: Id) -> Result<Modem>;
    /// `mac_address` is unique system-wide, independent of `cmts_id`.
    async fn find_modem_by_mac(&self, mac_address: &str) -> Result<Option<Modem>>;
    /// Ordered by `last_seen` descending, per spec.md §3.
    async fn list_modems(&self, filter: ModemFilter) -> Result<Vec<Modem>>;
    /// Marks modems unseen for more than `offline_after_minutes` as
    /// `OFFLINE`, then deletes modems that have been `OFFLINE` for more than
    /// `delete_after_days`. Returns `(marked_offline_count, deleted_count)`.
    async fn cleanup_stale_modems(
        &self,
        offline_after_minutes: i64,
        delete_after_days: i64,
        now: i64,
    ) -> Result<(u64, u64)>;
}

/// Port for upgrade rules. Implemented by `docsis-store`.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn create_rule(&self, input: RuleInput) -> Result<Rule>;
    async fn update_rule(&self, id: Id, input: RuleInput) -> Result<Rule>;
    async fn delete_rule(&self, id: Id) -> Result<()>;
    async fn get_rule(&self, id: Id) -> Result<Rule>;
    /// Ordered by priority descending, then name, per spec.md §3.
    async fn list_rules(&self) -> Result<Vec<Rule>>;
    async fn list_enabled_rules(&self) -> Result<Vec<Rule>>;
}

/// Port for upgrade jobs and their state machine. Implemented by `docsis-store`.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: NewJob) -> Result<Job>;
    async fn get_job(&self, id: Id) -> Result<Job>;
    /// Ordered by `created_at` descending, per spec.md §3.
    async fn list_jobs(&self, filter: JobFilter) -> Result<Vec<Job>>;
    /// True if a non-terminal job already exists for this modem, used by the
    /// rule matcher's dedup check (spec.md §8 invariant around dedup).
    async fn has_active_job_for_modem(&self, modem_id: Id) -> Result<bool>;
    /// Claims up to `limit` jobs eligible for dispatch (PENDING, and
    /// `retry_after <= now` or unset), atomically transitioning them to
    /// IN_PROGRESS and stamping `started_at`.
    async fn claim_pending_jobs(&self, limit: i64, now: i64) -> Result<Vec<Job>>;
    async fn mark_completed(&self, id: Id, now: i64) -> Result<Job>;
    /// Records a failed attempt. If `retry_count + 1 <= max_retries`, returns
    /// the job to PENDING with `retry_after` set; otherwise transitions to
    /// terminal FAILED.
    async fn record_failure(&self, id: Id, error_message: &str, retry_after: Option<i64>, now: i64)
        -> Result<Job>;
    async fn retry_job(&self, id: Id, now: i64) -> Result<Job>;
    /// Startup sweep: promotes orphaned IN_PROGRESS jobs (started more than
    /// `timeout_secs` ago) back to PENDING.
    async fn requeue_orphaned(&self, timeout_secs: i64, now: i64) -> Result<u64>;
    /// Aggregated job count per status, for the management API's `metrics()`.
    async fn count_jobs_by_status(&self) -> Result<Vec<(JobStatus, i64)>>;
}

/// Port for the best-effort audit trail. Implemented by `docsis-store`.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record(&self, event: NewActivityEvent) -> Result<ActivityEvent>;
    async fn list_activity(&self, limit: i64) -> Result<Vec<ActivityEvent>>;
    /// Total row count, for the management API's `metrics()`.
    async fn count_activity(&self) -> Result<i64>;
}

/// Port for the layered settings table. Implemented by `docsis-store`.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<Setting>>;
    async fn set_setting(&self, key: &str, value: &str, now: i64) -> Result<Setting>;
    async fn list_settings(&self) -> Result<Vec<Setting>>;
}

/// Aggregate of every port, so adapters and the engine can be handed one
/// `Arc<dyn Store>` instead of five separate trait objects.
pub trait Store: CmtsStore + ModemStore + RuleStore + JobStore + ActivityStore + SettingsStore {}

impl<T> Store for T where
    T: CmtsStore + ModemStore + RuleStore + JobStore + ActivityStore + SettingsStore
{
}
