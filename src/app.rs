//! Process bootstrap: store selection, router assembly, tracing and shutdown.

use crate::config::AppConfig;
use crate::service::ContactService;
use crate::storage::{FileStore, MemoryStore, RetryingStore, SharedStore};
use crate::web::{AppState, build_router};
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub struct ContactsBootstrap {
    pub router: Router,
    pub service: ContactService,
}

pub async fn bootstrap(config: &AppConfig) -> Result<ContactsBootstrap> {
    info!(
        bind = %config.bind_addr(),
        data_dir = ?config.data_dir(),
        base_path = %config.base_path(),
        bulk_policy = ?config.bulk_policy(),
        "bootstrapping contacts api"
    );

    let store = open_store(config).await?;
    let service = ContactService::new(store)
        .with_page_limits(config.page_limits())
        .with_bulk_policy(config.bulk_policy());
    let router = build_router(AppState::new(service.clone()), config.base_path());

    Ok(ContactsBootstrap { router, service })
}

/// File-backed when a data dir is configured, in-memory otherwise. Either
/// way the store is wrapped with the configured retry policy.
pub async fn open_store(config: &AppConfig) -> Result<SharedStore> {
    let retry = config.retry();
    let store: SharedStore = match config.data_dir() {
        Some(dir) => {
            let file = FileStore::open(dir)
                .await
                .with_context(|| format!("failed to open contact store at '{}'", dir.display()))?;
            Arc::new(RetryingStore::new(file, retry))
        }
        None => Arc::new(RetryingStore::new(MemoryStore::new(), retry)),
    };
    Ok(store)
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("contacts_api=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
