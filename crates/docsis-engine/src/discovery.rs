use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use docsis_core::error::Result;
use docsis_core::ports::Store;
use docsis_core::types::{Cmts, EventType, ModemUpsert, NewActivityEvent};
use docsis_snmp::{SessionConfig, SnmpSession};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use crate::ratelimit::RateLimiter;

/// Fan-out discovery across the enabled CMTS fleet (spec.md §4.4). Each
/// CMTS is polled by its own task, bounded by a semaphore sized
/// `workers`; every SNMP query inside those tasks passes through a shared
/// [`RateLimiter`] so the fleet-wide query rate stays under
/// `rate_limit_per_sec` regardless of how many CMTSes are being walked at
/// once. A single consumer task owns all writes to the store.
pub struct DiscoveryCoordinator {
    store: Arc<dyn Store>,
    workers: usize,
    rate_limiter: Arc<RateLimiter>,
    snmp_timeout: Duration,
    snmp_retries: u32,
    snmp_max_oids: u32,
}

#[derive(Debug, Default)]
pub struct DiscoverySummary {
    pub cmts_polled: usize,
    pub cmts_failed: usize,
    pub modems_seen: usize,
}

impl DiscoveryCoordinator {
    pub fn new(
        store: Arc<dyn Store>,
        workers: usize,
        rate_limit_per_sec: u32,
        snmp_timeout: Duration,
        snmp_retries: u32,
        snmp_max_oids: u32,
    ) -> Self {
        Self {
            store,
            workers: workers.max(1),
            rate_limiter: Arc::new(RateLimiter::new(rate_limit_per_sec)),
            snmp_timeout,
            snmp_retries,
            snmp_max_oids,
        }
    }

    pub async fn run_once(&self) -> Result<DiscoverySummary> {
        let cmts_list = self.store.list_enabled_cmts().await?;
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::channel::<ModemUpsert>(256);

        let store = self.store.clone();
        let consumer = tokio::spawn(async move {
            let mut seen = 0usize;
            while let Some(upsert) = rx.recv().await {
                let mac = upsert.mac_address.clone();
                let already_known = store.find_modem_by_mac(&mac).await.ok().flatten().is_some();
                match store.upsert_modem(upsert).await {
                    Ok(modem) => {
                        seen += 1;
                        if !already_known {
                            let _ = store
                                .record(NewActivityEvent {
                                    event_type: EventType::ModemDiscovered,
                                    entity_type: "modem".to_string(),
                                    entity_id: Some(modem.id),
                                    message: format!("discovered modem {}", modem.mac_address),
                                    details: None,
                                })
                                .await;
                        }
                    }
                    Err(e) => error!(error = %e, mac, "failed to upsert discovered modem"),
                }
            }
            seen
        });

        let mut handles = Vec::with_capacity(cmts_list.len());
        for cmts in cmts_list {
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            let tx = tx.clone();
            let rate_limiter = self.rate_limiter.clone();
            let timeout = self.snmp_timeout;
            let retries = self.snmp_retries;
            let max_oids = self.snmp_max_oids;
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                poll_one_cmts(cmts, tx, rate_limiter, timeout, retries, max_oids).await
            }));
        }

        let mut cmts_polled = 0;
        let mut cmts_failed = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => cmts_polled += 1,
                Ok(Err(e)) => {
                    cmts_failed += 1;
                    warn!(error = %e, "cmts discovery poll failed");
                }
                Err(e) => {
                    cmts_failed += 1;
                    error!(error = %e, "cmts discovery task panicked");
                }
            }
        }

        drop(tx);
        let modems_seen = consumer.await.unwrap_or(0);

        info!(cmts_polled, cmts_failed, modems_seen, "discovery sweep complete");
        Ok(DiscoverySummary {
            cmts_polled,
            cmts_failed,
            modems_seen,
        })
    }
}

async fn poll_one_cmts(
    cmts: Cmts,
    tx: mpsc::Sender<ModemUpsert>,
    rate_limiter: Arc<RateLimiter>,
    timeout: Duration,
    retries: u32,
    max_oids: u32,
) -> Result<()> {
    let session = SnmpSession::open(SessionConfig {
        host: cmts.ip_address.clone(),
        port: cmts.snmp_port,
        community_read: cmts.community_read.clone(),
        community_write: cmts.community_write.clone(),
        version: cmts.snmp_version,
        timeout,
        retries,
        max_oids_per_request: max_oids,
    })
    .await?;

    rate_limiter.acquire().await;
    let rows = session.discover_modems().await?;

    for (mac, index) in rows {
        rate_limiter.acquire().await;
        let ip = session.get_modem_ip(&index).await.unwrap_or(None);
        rate_limiter.acquire().await;
        let signal = session.get_signal_level(&index).await.unwrap_or(None);
        rate_limiter.acquire().await;
        let status = session
            .get_modem_status(&index)
            .await
            .unwrap_or(docsis_core::types::ModemStatus::Unknown);

        let sys_descr = if let (Some(ip), Some(cm_community)) = (&ip, &cmts.cm_community_string) {
            if let Ok(addr) = format!("{ip}:161").parse::<SocketAddr>() {
                rate_limiter.acquire().await;
                session.get_sys_descr(addr, cm_community).await.unwrap_or(None)
            } else {
                None
            }
        } else {
            None
        };

        let current_firmware = sys_descr.as_deref().and_then(docsis_rules::extract_version_token);

        let upsert = ModemUpsert {
            cmts_id: cmts.id,
            mac_address: mac,
            ip_address: ip,
            sys_descr,
            current_firmware,
            signal_level: signal,
            status,
        };

        if tx.send(upsert).await.is_err() {
            break;
        }
    }

    Ok(())
}
