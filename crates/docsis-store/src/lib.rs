//! SQLite implementation of every `docsis_core::ports` trait, behind one
//! `SqliteStore` handle cloneable across tasks (`SqlitePool` is already an
//! `Arc` internally).

mod activity;
mod cmts;
mod job;
mod modem;
mod pool;
mod retry;
mod rows;
mod rule;
mod settings;
mod time;

use sqlx::SqlitePool;

pub use pool::open;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsis_core::ports::{ActivityStore, CmtsStore, JobStore, ModemStore, RuleStore};
    use docsis_core::types::{
        CmtsInput, EventType, MatchCriteria, ModemFilter, ModemStatus, ModemUpsert,
        NewActivityEvent, NewJob, RuleInput, SnmpVersion,
    };

    async fn test_store() -> SqliteStore {
        let pool = open("sqlite::memory:").await.unwrap();
        SqliteStore::new(pool)
    }

    fn cmts_input() -> CmtsInput {
        CmtsInput {
            name: "cmts-1".to_string(),
            ip_address: "10.0.0.1".to_string(),
            snmp_port: 161,
            community_read: "public".to_string(),
            community_write: Some("private".to_string()),
            cm_community_string: None,
            snmp_version: SnmpVersion::V2,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn create_and_get_cmts_round_trips() {
        let store = test_store().await;
        let created = store.create_cmts(cmts_input()).await.unwrap();
        let fetched = store.get_cmts(created.id).await.unwrap();
        assert_eq!(fetched.name, "cmts-1");
        assert_eq!(fetched.snmp_version, SnmpVersion::V2);
    }

    #[tokio::test]
    async fn list_cmts_orders_by_name() {
        let store = test_store().await;
        let mut b = cmts_input();
        b.name = "zzz".to_string();
        store.create_cmts(b).await.unwrap();
        let mut a = cmts_input();
        a.name = "aaa".to_string();
        store.create_cmts(a).await.unwrap();

        let list = store.list_cmts().await.unwrap();
        assert_eq!(list[0].name, "aaa");
        assert_eq!(list[1].name, "zzz");
    }

    #[tokio::test]
    async fn upsert_modem_is_keyed_by_mac_alone() {
        let store = test_store().await;
        let cmts = store.create_cmts(cmts_input()).await.unwrap();

        let first = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts.id,
                mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
                ip_address: Some("10.1.1.1".to_string()),
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();

        let second = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts.id,
                mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
                ip_address: Some("10.1.1.2".to_string()),
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(1.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.ip_address.as_deref(), Some("10.1.1.2"));

        let all = store.list_modems(ModemFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn upsert_modem_moves_mac_between_cmts_instead_of_duplicating() {
        let store = test_store().await;
        let cmts_a = store.create_cmts(cmts_input()).await.unwrap();
        let mut other = cmts_input();
        other.name = "cmts-2".to_string();
        other.ip_address = "10.0.0.2".to_string();
        let cmts_b = store.create_cmts(other).await.unwrap();

        let first = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts_a.id,
                mac_address: "aa:bb:cc:dd:ee:01".to_string(),
                ip_address: Some("10.1.1.1".to_string()),
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();

        // the same modem reconnects behind a different CMTS
        let moved = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts_b.id,
                mac_address: "aa:bb:cc:dd:ee:01".to_string(),
                ip_address: Some("10.2.2.2".to_string()),
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();

        assert_eq!(first.id, moved.id);
        assert_eq!(moved.cmts_id, cmts_b.id);

        let all = store.list_modems(ModemFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        let found = store.find_modem_by_mac("aa:bb:cc:dd:ee:01").await.unwrap().unwrap();
        assert_eq!(found.cmts_id, cmts_b.id);
    }

    #[tokio::test]
    async fn cleanup_stale_modems_marks_then_deletes() {
        let store = test_store().await;
        let cmts = store.create_cmts(cmts_input()).await.unwrap();
        store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts.id,
                mac_address: "aa:bb:cc:dd:ee:02".to_string(),
                ip_address: None,
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();

        // last_seen is stamped with "now" by upsert_modem; simulate staleness
        // by sweeping far enough into the future that it crosses both
        // thresholds on the first pass.
        let far_future = docsis_core::clock::now_unix() + 400 * 24 * 3600;
        let (marked, deleted) = store.cleanup_stale_modems(10, 7, far_future).await.unwrap();
        assert_eq!(marked, 1);
        assert_eq!(deleted, 1);

        let all = store.list_modems(ModemFilter::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn job_retry_and_dead_letter_flow() {
        let store = test_store().await;
        let cmts = store.create_cmts(cmts_input()).await.unwrap();
        let modem = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts.id,
                mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
                ip_address: None,
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();
        let rule = store
            .create_rule(RuleInput {
                name: "r1".to_string(),
                description: None,
                criteria: MatchCriteria::SysDescrRegex {
                    pattern: ".*".to_string(),
                },
                tftp_server_ip: "10.0.0.2".to_string(),
                firmware_filename: "fw-v2.bin".to_string(),
                enabled: true,
                priority: 0,
            })
            .await
            .unwrap();

        let job = store
            .create_job(NewJob {
                modem_id: modem.id,
                rule_id: rule.id,
                cmts_id: cmts.id,
                mac_address: modem.mac_address.clone(),
                tftp_server_ip: rule.tftp_server_ip.clone(),
                firmware_filename: rule.firmware_filename.clone(),
                max_retries: 2,
            })
            .await
            .unwrap();

        assert!(store.has_active_job_for_modem(modem.id).await.unwrap());

        let claimed = store.claim_pending_jobs(10, 1_000).await.unwrap();
        assert_eq!(claimed.len(), 1);

        let after_first_failure = store
            .record_failure(job.id, "timeout", Some(1_030), 1_000)
            .await
            .unwrap();
        assert_eq!(after_first_failure.status.as_str(), "PENDING");
        assert_eq!(after_first_failure.retry_count, 1);

        let claimed_again = store.claim_pending_jobs(10, 1_030).await.unwrap();
        assert_eq!(claimed_again.len(), 1);

        let after_second_failure = store
            .record_failure(job.id, "timeout again", Some(1_060), 1_030)
            .await
            .unwrap();
        assert_eq!(after_second_failure.status.as_str(), "PENDING");

        let claimed_third = store.claim_pending_jobs(10, 1_060).await.unwrap();
        assert_eq!(claimed_third.len(), 1);

        let terminal = store
            .record_failure(job.id, "final failure", None, 1_060)
            .await
            .unwrap();
        assert_eq!(terminal.status.as_str(), "FAILED");
        assert!(!store.has_active_job_for_modem(modem.id).await.unwrap());

        let retried = store.retry_job(job.id, 2_000).await.unwrap();
        assert_eq!(retried.status.as_str(), "PENDING");
        assert_eq!(retried.retry_count, 0);
    }

    #[tokio::test]
    async fn retry_job_rejects_jobs_that_are_not_failed() {
        let store = test_store().await;
        let cmts = store.create_cmts(cmts_input()).await.unwrap();
        let modem = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts.id,
                mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
                ip_address: None,
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();
        let rule = store
            .create_rule(RuleInput {
                name: "r1".to_string(),
                description: None,
                criteria: MatchCriteria::SysDescrRegex {
                    pattern: ".*".to_string(),
                },
                tftp_server_ip: "10.0.0.2".to_string(),
                firmware_filename: "fw-v2.bin".to_string(),
                enabled: true,
                priority: 0,
            })
            .await
            .unwrap();
        let job = store
            .create_job(NewJob {
                modem_id: modem.id,
                rule_id: rule.id,
                cmts_id: cmts.id,
                mac_address: modem.mac_address.clone(),
                tftp_server_ip: rule.tftp_server_ip.clone(),
                firmware_filename: rule.firmware_filename.clone(),
                max_retries: 2,
            })
            .await
            .unwrap();

        // a PENDING job has not failed yet and should not be retryable
        assert!(store.retry_job(job.id, 0).await.is_err());

        store.claim_pending_jobs(10, 0).await.unwrap();
        // an IN_PROGRESS job must not be silently reset to PENDING underneath
        // a worker that is still processing it
        assert!(store.retry_job(job.id, 0).await.is_err());
        let unchanged = store.get_job(job.id).await.unwrap();
        assert_eq!(unchanged.status.as_str(), "IN_PROGRESS");
    }

    #[tokio::test]
    async fn requeue_orphaned_promotes_stale_in_progress_jobs() {
        let store = test_store().await;
        let cmts = store.create_cmts(cmts_input()).await.unwrap();
        let modem = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts.id,
                mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
                ip_address: None,
                sys_descr: None,
                current_firmware: None,
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();
        let rule = store
            .create_rule(RuleInput {
                name: "r1".to_string(),
                description: None,
                criteria: MatchCriteria::SysDescrRegex {
                    pattern: ".*".to_string(),
                },
                tftp_server_ip: "10.0.0.2".to_string(),
                firmware_filename: "fw-v2.bin".to_string(),
                enabled: true,
                priority: 0,
            })
            .await
            .unwrap();
        let job = store
            .create_job(NewJob {
                modem_id: modem.id,
                rule_id: rule.id,
                cmts_id: cmts.id,
                mac_address: modem.mac_address.clone(),
                tftp_server_ip: rule.tftp_server_ip.clone(),
                firmware_filename: rule.firmware_filename.clone(),
                max_retries: 2,
            })
            .await
            .unwrap();
        store.claim_pending_jobs(10, 0).await.unwrap();

        let requeued = store.requeue_orphaned(600, 10_000).await.unwrap();
        assert_eq!(requeued, 1);

        let refetched = store.get_job(job.id).await.unwrap();
        assert_eq!(refetched.status.as_str(), "PENDING");
    }

    #[tokio::test]
    async fn activity_log_records_and_lists() {
        let store = test_store().await;
        store
            .record(NewActivityEvent {
                event_type: EventType::SystemEvent,
                entity_type: "system".to_string(),
                entity_id: None,
                message: "controller started".to_string(),
                details: None,
            })
            .await
            .unwrap();

        let events = store.list_activity(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "controller started");
    }
}
