use std::sync::Arc;

use docsis_core::config::Settings;
use docsis_core::error::Result;
use docsis_core::ports::Store;
use docsis_core::types::{ModemFilter, NewJob};
use tracing::{debug, info};

/// Evaluates every currently-known modem against the enabled rule set and
/// creates upgrade jobs for matches that don't already have one in flight
/// (spec.md §4.3/§4.5 dedup rule). Pure decision logic lives in
/// `docsis_rules`; this just wires it to the store.
pub struct RuleEvaluator {
    store: Arc<dyn Store>,
    job_max_retries: i64,
    signal_min_dbmv: f64,
    signal_max_dbmv: f64,
}

impl RuleEvaluator {
    pub fn new(store: Arc<dyn Store>, settings: &Settings) -> Self {
        Self {
            store,
            job_max_retries: settings.job_max_retries,
            signal_min_dbmv: settings.signal_level_min_dbmv,
            signal_max_dbmv: settings.signal_level_max_dbmv,
        }
    }

    pub async fn run_once(&self) -> Result<usize> {
        let rules = self.store.list_enabled_rules().await?;
        if rules.is_empty() {
            debug!("no enabled rules, skipping rule evaluation");
            return Ok(0);
        }

        let modems = self.store.list_modems(ModemFilter::default()).await?;
        let mut created = 0;

        for modem in &modems {
            if self.store.has_active_job_for_modem(modem.id).await? {
                continue;
            }
            let Some(rule) =
                docsis_rules::find_matching_rule(modem, &rules, self.signal_min_dbmv, self.signal_max_dbmv)
            else {
                continue;
            };

            self.store
                .create_job(NewJob {
                    modem_id: modem.id,
                    rule_id: rule.id,
                    cmts_id: modem.cmts_id,
                    mac_address: modem.mac_address.clone(),
                    tftp_server_ip: rule.tftp_server_ip.clone(),
                    firmware_filename: rule.firmware_filename.clone(),
                    max_retries: self.job_max_retries,
                })
                .await?;
            created += 1;
        }

        if created > 0 {
            info!(created, "rule evaluation created upgrade jobs");
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsis_core::ports::{CmtsStore, ModemStore, RuleStore};
    use docsis_core::types::{CmtsInput, MatchCriteria, ModemStatus, ModemUpsert, RuleInput, SnmpVersion};
    use docsis_store::SqliteStore;

    async fn test_store() -> Arc<dyn Store> {
        let pool = docsis_store::open("sqlite::memory:").await.unwrap();
        Arc::new(SqliteStore::new(pool))
    }

    #[tokio::test]
    async fn creates_job_for_matching_eligible_modem_once() {
        let store = test_store().await;
        let cmts = store
            .create_cmts(CmtsInput {
                name: "cmts-1".to_string(),
                ip_address: "10.0.0.1".to_string(),
                snmp_port: 161,
                community_read: "public".to_string(),
                community_write: Some("private".to_string()),
                cm_community_string: None,
                snmp_version: SnmpVersion::V2,
                enabled: true,
            })
            .await
            .unwrap();

        let modem = store
            .upsert_modem(ModemUpsert {
                cmts_id: cmts.id,
                mac_address: "aa:bb:cc:00:00:01".to_string(),
                ip_address: Some("10.1.1.1".to_string()),
                sys_descr: None,
                current_firmware: Some("v1.0.0".to_string()),
                signal_level: Some(0.0),
                status: ModemStatus::Online,
            })
            .await
            .unwrap();

        let start = docsis_core::mac::parse("aa:bb:cc:00:00:00").unwrap();
        let end = docsis_core::mac::parse("aa:bb:cc:00:00:ff").unwrap();
        store
            .create_rule(RuleInput {
                name: "upgrade-all".to_string(),
                description: None,
                criteria: MatchCriteria::MacRange { start, end },
                tftp_server_ip: "10.0.0.9".to_string(),
                firmware_filename: "fw-v2.0.0.bin".to_string(),
                enabled: true,
                priority: 0,
            })
            .await
            .unwrap();

        let evaluator = RuleEvaluator::new(store.clone(), &Settings::default());
        let created = evaluator.run_once().await.unwrap();
        assert_eq!(created, 1);
        assert!(store.has_active_job_for_modem(modem.id).await.unwrap());

        // a second pass must not create a duplicate job for the same modem
        let created_again = evaluator.run_once().await.unwrap();
        assert_eq!(created_again, 0);
    }
}
