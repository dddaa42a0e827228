use clap::Parser;

/// Process-level configuration, layered above the `settings` DB table and
/// `docsis_core::config::Settings::default()` per spec.md §3's authority
/// ordering. Every flag has a `DOCSIS_*` environment fallback via clap's
/// `env` feature.
#[derive(Debug, Parser)]
#[command(name = "docsis-controller", version, about)]
pub struct Cli {
    /// SQLite connection string, e.g. sqlite://data/docsis.db
    #[arg(long, env = "DOCSIS_DATABASE_URL", default_value = "sqlite://docsis.db")]
    pub database_url: String,

    /// Address the management API binds to.
    #[arg(long, env = "DOCSIS_HTTP_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub http_bind_addr: String,

    /// tracing EnvFilter directive, same semantics as RUST_LOG.
    #[arg(long, env = "DOCSIS_LOG", default_value = "info,docsis_engine=debug")]
    pub log: String,
}
