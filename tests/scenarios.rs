//! End-to-end scenarios wiring `docsis-rules`, `docsis-engine`, and
//! `docsis-store` together without a live SNMP session, covering spec.md
//! §8's testable properties S1-S6.

use std::sync::Arc;

use docsis_core::config::Settings;
use docsis_core::ports::{CmtsStore, JobStore, ModemStore, RuleStore, Store};
use docsis_core::types::{
    CmtsInput, MatchCriteria, ModemStatus, ModemUpsert, RuleInput, SnmpVersion,
};
use docsis_engine::RuleEvaluator;
use docsis_store::SqliteStore;

async fn fresh_store() -> Arc<dyn Store> {
    let pool = docsis_store::open("sqlite::memory:").await.unwrap();
    Arc::new(SqliteStore::new(pool))
}

async fn seed_cmts(store: &Arc<dyn Store>, name: &str) -> docsis_core::types::Cmts {
    store
        .create_cmts(CmtsInput {
            name: name.to_string(),
            ip_address: "10.0.0.1".to_string(),
            snmp_port: 161,
            community_read: "public".to_string(),
            community_write: Some("private".to_string()),
            cm_community_string: None,
            snmp_version: SnmpVersion::V2,
            enabled: true,
        })
        .await
        .unwrap()
}

fn mac_range_rule(name: &str, start: &str, end: &str, fw: &str, priority: i64) -> RuleInput {
    RuleInput {
        name: name.to_string(),
        description: None,
        criteria: MatchCriteria::MacRange {
            start: docsis_core::mac::parse(start).unwrap(),
            end: docsis_core::mac::parse(end).unwrap(),
        },
        tftp_server_ip: "10.0.0.9".to_string(),
        firmware_filename: fw.to_string(),
        enabled: true,
        priority,
    }
}

/// S1: a modem inside an enabled MAC_RANGE rule's bounds, online, with
/// acceptable signal, gets an upgrade job created against it.
#[tokio::test]
async fn s1_happy_path_mac_range_creates_job() {
    let store = fresh_store().await;
    let cmts = seed_cmts(&store, "cmts-1").await;
    let modem = store
        .upsert_modem(ModemUpsert {
            cmts_id: cmts.id,
            mac_address: "aa:bb:cc:00:00:10".to_string(),
            ip_address: Some("10.1.1.10".to_string()),
            sys_descr: None,
            current_firmware: Some("v1.0.0".to_string()),
            signal_level: Some(2.0),
            status: ModemStatus::Online,
        })
        .await
        .unwrap();
    store
        .create_rule(mac_range_rule(
            "fw-upgrade",
            "aa:bb:cc:00:00:00",
            "aa:bb:cc:00:00:ff",
            "fw-v2.0.0.bin",
            0,
        ))
        .await
        .unwrap();

    let evaluator = RuleEvaluator::new(store.clone(), &Settings::default());
    let created = evaluator.run_once().await.unwrap();
    assert_eq!(created, 1);
    assert!(store.has_active_job_for_modem(modem.id).await.unwrap());
}

/// S2: an offline modem, or one with out-of-band signal, is never matched
/// even though its MAC falls inside a matching rule's range.
#[tokio::test]
async fn s2_eligibility_filter_excludes_offline_and_marginal_signal() {
    let store = fresh_store().await;
    let cmts = seed_cmts(&store, "cmts-1").await;
    let offline = store
        .upsert_modem(ModemUpsert {
            cmts_id: cmts.id,
            mac_address: "aa:bb:cc:00:00:11".to_string(),
            ip_address: Some("10.1.1.11".to_string()),
            sys_descr: None,
            current_firmware: Some("v1.0.0".to_string()),
            signal_level: Some(0.0),
            status: ModemStatus::Offline,
        })
        .await
        .unwrap();
    let marginal = store
        .upsert_modem(ModemUpsert {
            cmts_id: cmts.id,
            mac_address: "aa:bb:cc:00:00:12".to_string(),
            ip_address: Some("10.1.1.12".to_string()),
            sys_descr: None,
            current_firmware: Some("v1.0.0".to_string()),
            signal_level: Some(50.0),
            status: ModemStatus::Online,
        })
        .await
        .unwrap();
    store
        .create_rule(mac_range_rule(
            "fw-upgrade",
            "aa:bb:cc:00:00:00",
            "aa:bb:cc:00:00:ff",
            "fw-v2.0.0.bin",
            0,
        ))
        .await
        .unwrap();

    let evaluator = RuleEvaluator::new(store.clone(), &Settings::default());
    evaluator.run_once().await.unwrap();

    assert!(!store.has_active_job_for_modem(offline.id).await.unwrap());
    assert!(!store.has_active_job_for_modem(marginal.id).await.unwrap());
}

/// S3: when two enabled rules both match a modem, the higher-priority rule
/// wins and supplies the firmware for the created job.
#[tokio::test]
async fn s3_priority_ordering_picks_highest_priority_match() {
    let store = fresh_store().await;
    let cmts = seed_cmts(&store, "cmts-1").await;
    let modem = store
        .upsert_modem(ModemUpsert {
            cmts_id: cmts.id,
            mac_address: "aa:bb:cc:00:00:13".to_string(),
            ip_address: Some("10.1.1.13".to_string()),
            sys_descr: None,
            current_firmware: Some("v1.0.0".to_string()),
            signal_level: Some(0.0),
            status: ModemStatus::Online,
        })
        .await
        .unwrap();
    store
        .create_rule(mac_range_rule(
            "low-priority",
            "aa:bb:cc:00:00:00",
            "aa:bb:cc:00:00:ff",
            "fw-v2.0.0.bin",
            1,
        ))
        .await
        .unwrap();
    store
        .create_rule(mac_range_rule(
            "high-priority",
            "aa:bb:cc:00:00:00",
            "aa:bb:cc:00:00:ff",
            "fw-v3.0.0.bin",
            10,
        ))
        .await
        .unwrap();

    let evaluator = RuleEvaluator::new(store.clone(), &Settings::default());
    evaluator.run_once().await.unwrap();

    let jobs = store
        .list_jobs(docsis_core::types::JobFilter::default())
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].firmware_filename, "fw-v3.0.0.bin");
    let _ = modem;
}

/// S4: a modem with a job already PENDING or IN_PROGRESS is skipped by
/// rule evaluation, preventing duplicate upgrade jobs.
#[tokio::test]
async fn s4_dedup_against_in_progress_job() {
    let store = fresh_store().await;
    let cmts = seed_cmts(&store, "cmts-1").await;
    store
        .upsert_modem(ModemUpsert {
            cmts_id: cmts.id,
            mac_address: "aa:bb:cc:00:00:14".to_string(),
            ip_address: Some("10.1.1.14".to_string()),
            sys_descr: None,
            current_firmware: Some("v1.0.0".to_string()),
            signal_level: Some(0.0),
            status: ModemStatus::Online,
        })
        .await
        .unwrap();
    store
        .create_rule(mac_range_rule(
            "fw-upgrade",
            "aa:bb:cc:00:00:00",
            "aa:bb:cc:00:00:ff",
            "fw-v2.0.0.bin",
            0,
        ))
        .await
        .unwrap();

    let evaluator = RuleEvaluator::new(store.clone(), &Settings::default());
    let first_pass = evaluator.run_once().await.unwrap();
    let second_pass = evaluator.run_once().await.unwrap();

    assert_eq!(first_pass, 1);
    assert_eq!(second_pass, 0);
}

/// S5: a failed attempt under the retry budget returns to PENDING with a
/// future `retry_after`, and becomes claimable again only once that time
/// has passed.
#[tokio::test]
async fn s5_retry_respects_backoff_window() {
    let store = fresh_store().await;
    let cmts = seed_cmts(&store, "cmts-1").await;
    let modem = store
        .upsert_modem(ModemUpsert {
            cmts_id: cmts.id,
            mac_address: "aa:bb:cc:00:00:15".to_string(),
            ip_address: Some("10.1.1.15".to_string()),
            sys_descr: None,
            current_firmware: Some("v1.0.0".to_string()),
            signal_level: Some(0.0),
            status: ModemStatus::Online,
        })
        .await
        .unwrap();
    let rule = store
        .create_rule(mac_range_rule(
            "fw-upgrade",
            "aa:bb:cc:00:00:00",
            "aa:bb:cc:00:00:ff",
            "fw-v2.0.0.bin",
            0,
        ))
        .await
        .unwrap();

    let job = store
        .create_job(docsis_core::types::NewJob {
            modem_id: modem.id,
            rule_id: rule.id,
            cmts_id: cmts.id,
            mac_address: modem.mac_address.clone(),
            tftp_server_ip: rule.tftp_server_ip.clone(),
            firmware_filename: rule.firmware_filename.clone(),
            max_retries: 3,
        })
        .await
        .unwrap();

    let claimed = store.claim_pending_jobs(10, 1_000).await.unwrap();
    assert_eq!(claimed.len(), 1);

    let settings = Settings::default();
    let retry_after = 1_000 + settings.backoff_secs(1);
    let failed = store
        .record_failure(job.id, "simulated timeout", Some(retry_after), 1_000)
        .await
        .unwrap();
    assert_eq!(failed.status.as_str(), "PENDING");
    assert_eq!(failed.retry_after, Some(retry_after));

    let too_early = store.claim_pending_jobs(10, retry_after - 1).await.unwrap();
    assert!(too_early.is_empty());

    let after_window = store.claim_pending_jobs(10, retry_after).await.unwrap();
    assert_eq!(after_window.len(), 1);
}

/// S6: once a job exhausts its retry budget, the next failure is terminal
/// and the job no longer counts as active for dedup purposes.
#[tokio::test]
async fn s6_exhausted_retries_reach_terminal_failure() {
    let store = fresh_store().await;
    let cmts = seed_cmts(&store, "cmts-1").await;
    let modem = store
        .upsert_modem(ModemUpsert {
            cmts_id: cmts.id,
            mac_address: "aa:bb:cc:00:00:16".to_string(),
            ip_address: Some("10.1.1.16".to_string()),
            sys_descr: None,
            current_firmware: Some("v1.0.0".to_string()),
            signal_level: Some(0.0),
            status: ModemStatus::Online,
        })
        .await
        .unwrap();
    let rule = store
        .create_rule(mac_range_rule(
            "fw-upgrade",
            "aa:bb:cc:00:00:00",
            "aa:bb:cc:00:00:ff",
            "fw-v2.0.0.bin",
            0,
        ))
        .await
        .unwrap();
    let job = store
        .create_job(docsis_core::types::NewJob {
            modem_id: modem.id,
            rule_id: rule.id,
            cmts_id: cmts.id,
            mac_address: modem.mac_address.clone(),
            tftp_server_ip: rule.tftp_server_ip.clone(),
            firmware_filename: rule.firmware_filename.clone(),
            max_retries: 1,
        })
        .await
        .unwrap();

    store.claim_pending_jobs(10, 0).await.unwrap();
    let first_failure = store.record_failure(job.id, "err1", Some(30), 0).await.unwrap();
    assert_eq!(first_failure.status.as_str(), "PENDING");

    store.claim_pending_jobs(10, 30).await.unwrap();
    let terminal = store.record_failure(job.id, "err2", None, 30).await.unwrap();
    assert_eq!(terminal.status.as_str(), "FAILED");
    assert!(!store.has_active_job_for_modem(modem.id).await.unwrap());
}
