use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use docsis_core::clock::now_unix;
use docsis_core::config::Settings;
use docsis_core::error::Result;
use docsis_core::ports::Store;
use docsis_core::types::{Cmts, EventType, Id, Job, NewActivityEvent};
use docsis_snmp::{oids::UpgradeStatus, SessionConfig, SnmpSession};
use tokio::sync::{RwLock, Semaphore};
use tracing::{error, info, warn};

/// Per-CMTS concurrency-capped worker pool. Follows the claim → process →
/// {mark done | record failure} loop of an outbox-style dispatcher: each
/// tick claims a batch of PENDING jobs and spawns one task per job, gated
/// by a semaphore unique to that job's CMTS so one noisy CMTS can't starve
/// every other CMTS's share of worker capacity (spec.md §5).
pub struct WorkerPool {
    store: Arc<dyn Store>,
    settings: Settings,
    semaphores: RwLock<HashMap<Id, Arc<Semaphore>>>,
}

const CLAIM_BATCH_SIZE: i64 = 32;

impl WorkerPool {
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> Self {
        Self {
            store,
            settings,
            semaphores: RwLock::new(HashMap::new()),
        }
    }

    /// Claims whatever is eligible right now and spawns a task per job,
    /// returning immediately — callers don't wait for jobs to finish.
    pub async fn dispatch_tick(&self) -> Result<usize> {
        let now = now_unix();
        let jobs = self.store.claim_pending_jobs(CLAIM_BATCH_SIZE, now).await?;
        let dispatched = jobs.len();

        for job in jobs {
            let permit_sem = self.semaphore_for(job.cmts_id).await;
            let store = self.store.clone();
            let settings = self.settings.clone();
            tokio::spawn(async move {
                let _permit = match permit_sem.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => return,
                };
                process_job(store, settings, job).await;
            });
        }

        Ok(dispatched)
    }

    async fn semaphore_for(&self, cmts_id: Id) -> Arc<Semaphore> {
        if let Some(sem) = self.semaphores.read().await.get(&cmts_id) {
            return sem.clone();
        }
        let mut write = self.semaphores.write().await;
        write
            .entry(cmts_id)
            .or_insert_with(|| Arc::new(Semaphore::new(self.settings.max_concurrent_jobs_per_cmts)))
            .clone()
    }
}

async fn process_job(store: Arc<dyn Store>, settings: Settings, job: Job) {
    let job_id = job.id;
    if let Err(e) = emit(&store, EventType::UpgradeStarted, job.modem_id, &format!(
        "starting firmware upgrade for {}",
        job.mac_address
    ))
    .await
    {
        warn!(job_id, error = %e, "failed to emit UpgradeStarted event");
    }

    match run_upgrade(&store, &settings, &job).await {
        Ok(()) => {
            let now = now_unix();
            if let Err(e) = store.mark_completed(job_id, now).await {
                error!(job_id, error = %e, "failed to mark job completed");
                return;
            }
            let _ = emit(
                &store,
                EventType::UpgradeCompleted,
                job.modem_id,
                &format!("firmware upgrade completed for {}", job.mac_address),
            )
            .await;
            info!(job_id, mac = %job.mac_address, "upgrade job completed");
        }
        Err(e) => {
            let now = now_unix();
            let next_attempt = job.retry_count + 1;
            let retry_after = if next_attempt > job.max_retries {
                None
            } else {
                Some(now + settings.backoff_secs(next_attempt))
            };

            match store
                .record_failure(job_id, &e.to_string(), retry_after, now)
                .await
            {
                Ok(updated) => {
                    if updated.status.is_terminal() {
                        let _ = emit(
                            &store,
                            EventType::UpgradeFailed,
                            job.modem_id,
                            &format!("firmware upgrade failed for {}: {e}", job.mac_address),
                        )
                        .await;
                        warn!(job_id, mac = %job.mac_address, error = %e, "upgrade job failed permanently");
                    } else {
                        info!(job_id, mac = %job.mac_address, retry_count = updated.retry_count, "upgrade attempt failed, will retry");
                    }
                }
                Err(store_err) => {
                    error!(job_id, error = %store_err, "failed to record job failure");
                }
            }
        }
    }
}

async fn run_upgrade(store: &Arc<dyn Store>, settings: &Settings, job: &Job) -> Result<()> {
    let cmts = store.get_cmts(job.cmts_id).await?;
    let modem = store.get_modem(job.modem_id).await?;

    let ip = modem.ip_address.ok_or_else(|| {
        docsis_core::CoreError::Validation(format!("modem {} has no known IP address", modem.id))
    })?;
    let modem_addr: SocketAddr = format!("{ip}:161").parse().map_err(|e| {
        docsis_core::CoreError::Validation(format!("modem IP {ip} is not a valid address: {e}"))
    })?;

    let community_write = cmts_write_community(&cmts)?;

    let session = SnmpSession::open(SessionConfig {
        host: cmts.ip_address.clone(),
        port: cmts.snmp_port,
        community_read: cmts.community_read.clone(),
        community_write: cmts.community_write.clone(),
        version: cmts.snmp_version,
        timeout: Duration::from_secs(settings.snmp_timeout_secs),
        retries: settings.snmp_retries,
        max_oids_per_request: settings.snmp_max_oids_per_request,
    })
    .await?;

    session
        .trigger_firmware_upgrade(
            modem_addr,
            &community_write,
            &job.tftp_server_ip,
            &job.firmware_filename,
        )
        .await?;

    let deadline = std::time::Instant::now() + Duration::from_secs(settings.job_timeout_secs as u64);
    let poll_interval = Duration::from_secs(10);

    loop {
        tokio::time::sleep(poll_interval).await;
        match session.check_upgrade_status(modem_addr, &cmts.community_read).await? {
            UpgradeStatus::Completed => return Ok(()),
            UpgradeStatus::Failed => {
                return Err(docsis_core::CoreError::UpgradeRemote(
                    "modem reported upgrade failure".to_string(),
                ))
            }
            UpgradeStatus::InProgress | UpgradeStatus::Unknown => {
                if std::time::Instant::now() >= deadline {
                    return Err(docsis_core::CoreError::Timeout(Duration::from_secs(
                        settings.job_timeout_secs as u64,
                    )));
                }
            }
        }
    }
}

/// Chooses the SNMP write community per spec.md §4.6 step 3: prefer
/// `cm_community_string`, fall back to `community_write`, fail fast if both
/// are empty.
fn cmts_write_community(cmts: &Cmts) -> Result<String> {
    cmts.cm_community_string
        .clone()
        .or_else(|| cmts.community_write.clone())
        .ok_or_else(|| {
            docsis_core::CoreError::Validation(format!(
                "cmts {} has no cm_community_string or community_write configured; cannot trigger upgrades",
                cmts.id
            ))
        })
}

async fn emit(store: &Arc<dyn Store>, event_type: EventType, modem_id: Id, message: &str) -> Result<()> {
    store
        .record(NewActivityEvent {
            event_type,
            entity_type: "modem".to_string(),
            entity_id: Some(modem_id),
            message: message.to_string(),
            details: None,
        })
        .await
        .map(|_| ())
}
