use std::sync::Arc;
use std::time::Duration;

use docsis_core::config::Settings;
use docsis_core::error::Result;
use docsis_core::ports::Store;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cleanup::CleanupSweeper;
use crate::discovery::DiscoveryCoordinator;
use crate::rule_evaluation::RuleEvaluator;
use crate::worker_pool::WorkerPool;

/// Rule evaluation's first run waits this long after startup so the first
/// discovery sweep has a chance to populate the modem inventory (spec.md
/// §4.7).
const RULE_EVALUATION_WARMUP: Duration = Duration::from_secs(30);

/// Startup sweep (spec.md §9 suggested addition): promotes any IN_PROGRESS
/// job orphaned by a prior crash back to PENDING before the schedulers
/// start, so it re-enters the normal dispatch path instead of sitting
/// stuck forever.
pub async fn requeue_orphaned_jobs_on_startup(store: &Arc<dyn Store>, settings: &Settings) -> Result<u64> {
    let now = docsis_core::clock::now_unix();
    let count = store.requeue_orphaned(settings.job_timeout_secs, now).await?;
    if count > 0 {
        info!(count, "requeued orphaned in-progress jobs from a previous run");
    }
    Ok(count)
}

/// Spawns the four independent periodic loops named in spec.md §4.7, each
/// watching the same cancellation token. Returns their join handles so the
/// caller can await a clean shutdown.
pub fn spawn_schedulers(
    store: Arc<dyn Store>,
    settings: Settings,
    cancel: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::with_capacity(4);

    {
        let store = store.clone();
        let settings = settings.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let coordinator = DiscoveryCoordinator::new(
                store,
                settings.discovery_workers,
                settings.discovery_rate_limit_per_sec,
                Duration::from_secs(settings.snmp_timeout_secs),
                settings.snmp_retries,
                settings.snmp_max_oids_per_request,
            );
            run_loop(
                "discovery",
                Duration::from_secs(settings.discovery_interval_secs),
                Duration::ZERO,
                cancel,
                || async {
                    coordinator.run_once().await.map(|s| {
                        info!(?s, "discovery tick");
                    })
                },
            )
            .await;
        }));
    }

    {
        let evaluator = RuleEvaluator::new(store.clone(), &settings);
        let interval = Duration::from_secs(settings.rule_evaluation_interval_secs);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            run_loop("rule_evaluation", interval, RULE_EVALUATION_WARMUP, cancel, || async {
                evaluator.run_once().await.map(|_| ())
            })
            .await;
        }));
    }

    {
        let pool = WorkerPool::new(store.clone(), settings.clone());
        let interval = Duration::from_secs(settings.job_dispatch_interval_secs);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            run_loop("job_dispatch", interval, Duration::ZERO, cancel, || async {
                pool.dispatch_tick().await.map(|_| ())
            })
            .await;
        }));
    }

    {
        let sweeper = CleanupSweeper::new(
            store.clone(),
            settings.modem_offline_after_mins,
            settings.modem_delete_after_days,
        );
        let interval = Duration::from_secs(settings.cleanup_interval_secs);
        handles.push(tokio::spawn(async move {
            run_loop("cleanup", interval, Duration::ZERO, cancel, || async {
                sweeper.run_once().await.map(|_| ())
            })
            .await;
        }));
    }

    handles
}

async fn run_loop<F, Fut>(
    name: &'static str,
    period: Duration,
    initial_delay: Duration,
    cancel: CancellationToken,
    mut tick: F,
) where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    if !initial_delay.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(scheduler = name, "scheduler shutting down during warmup");
                return;
            }
            _ = tokio::time::sleep(initial_delay) => {}
        }
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(scheduler = name, "scheduler shutting down");
                return;
            }
            _ = interval.tick() => {
                if let Err(e) = tick().await {
                    warn!(scheduler = name, error = %e, "scheduler tick failed");
                }
            }
        }
    }
}
