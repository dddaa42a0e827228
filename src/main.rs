mod cli;

use std::sync::Arc;

use clap::Parser;
use docsis_core::config::Settings;
use docsis_core::ports::Store;
use docsis_engine::{requeue_orphaned_jobs_on_startup, spawn_schedulers, DiscoveryCoordinator, RuleEvaluator};
use docsis_store::SqliteStore;
use docsis_web::{build_router, AppState};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut settings = Settings::default();

    let pool = docsis_store::open(&cli.database_url).await?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));

    let persisted = store.list_settings().await?;
    settings.apply_persisted(&persisted);
    settings.http_bind_addr = cli.http_bind_addr.clone();

    requeue_orphaned_jobs_on_startup(&store, &settings).await?;

    let cancel = CancellationToken::new();
    let scheduler_handles = spawn_schedulers(store.clone(), settings.clone(), cancel.clone());

    let discovery = Arc::new(DiscoveryCoordinator::new(
        store.clone(),
        settings.discovery_workers,
        settings.discovery_rate_limit_per_sec,
        std::time::Duration::from_secs(settings.snmp_timeout_secs),
        settings.snmp_retries,
        settings.snmp_max_oids_per_request,
    ));
    let rule_evaluator = Arc::new(RuleEvaluator::new(store.clone(), &settings));

    let state = AppState {
        store,
        settings: settings.clone(),
        discovery,
        rule_evaluator,
    };

    let app = build_router(state);
    let listener = TcpListener::bind(&settings.http_bind_addr).await?;
    info!(addr = %settings.http_bind_addr, "docsis-controller listening");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    for handle in scheduler_handles {
        let _ = handle.await;
    }

    serve_result?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
