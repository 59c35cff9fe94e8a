use anyhow::{Context, Result};
use clap::Parser;
use contacts_api::{AppConfig, bootstrap, init_tracing, shutdown_signal};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Contact management API server.
///
/// Settings come from `CONTACTS_*` environment variables; flags override them.
#[derive(Debug, Parser)]
#[command(name = "contacts_api", version, about)]
struct Cli {
    /// Address to listen on (overrides CONTACTS_BIND_ADDR).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Directory for the contact snapshot (overrides CONTACTS_DATA_DIR).
    #[arg(long, conflicts_with = "in_memory")]
    data_dir: Option<PathBuf>,

    /// Keep contacts in memory only, ignoring CONTACTS_DATA_DIR.
    #[arg(long)]
    in_memory: bool,

    /// Mount point of the API routes (overrides CONTACTS_BASE_PATH).
    #[arg(long)]
    base_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("failed to read config")?;
    if let Some(bind) = cli.bind {
        config = config.with_bind_addr(bind);
    }
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if cli.in_memory {
        config = config.in_memory();
    }
    if let Some(base_path) = cli.base_path.as_deref() {
        config = config.with_base_path(base_path);
    }

    let boot = bootstrap(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .context("failed to bind listener")?;
    tracing::info!(addr = %config.bind_addr(), "contacts api listening");

    axum::serve(listener, boot.router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum serve error")?;

    Ok(())
}
