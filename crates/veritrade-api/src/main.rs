//! veritrade-api server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use veritrade_api::state::{AppConfig, AppState};
use veritrade_audit::{AuditStore, MemoryAuditStore, PgAuditStore};
use veritrade_policy::PolicyPack;

#[derive(Debug, Parser)]
#[command(name = "veritrade-api", version, about = "Trade-finance invoice verification service")]
struct Cli {
    /// Socket address to bind, e.g. 0.0.0.0:3001
    #[arg(long, default_value = "0.0.0.0:3001", env = "VERITRADE_LISTEN")]
    listen: SocketAddr,

    /// PostgreSQL url for the audit store. Falls back to in-memory storage
    /// when absent (state will not survive restarts).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Policy pack YAML file. Falls back to the builtin pack when absent.
    #[arg(long, env = "VERITRADE_POLICY_PACK")]
    policy_pack: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, default_value_t = false, env = "VERITRADE_JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let policy = match &cli.policy_pack {
        Some(path) => PolicyPack::load(path)?,
        None => {
            let pack = PolicyPack::builtin();
            info!(version = %pack.version, "using builtin policy pack");
            pack
        }
    };

    let store: Arc<dyn AuditStore> = match &cli.database_url {
        Some(url) => Arc::new(PgAuditStore::connect(url).await?),
        None => {
            tracing::warn!(
                "DATABASE_URL not set — running with the in-memory audit store. \
                 Audit records will not survive restarts."
            );
            Arc::new(MemoryAuditStore::new())
        }
    };

    let state = AppState::new(store, &policy, AppConfig::default());
    let app = veritrade_api::app(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(addr = %listener.local_addr()?, policy_version = %policy.version, "veritrade-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("veritrade_api=info,info"));
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown signal handler");
    }
}
