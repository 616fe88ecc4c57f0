//! Front-end server

use std::sync::Arc;

use crate::client::KvClient;
use crate::common::{Config, Result};
use crate::frontend::http::{create_router, AppState};
use crate::frontend::views::Views;
use crate::store::{PoolConfig, RedisConnector};

pub struct Frontend {
    config: Config,
}

impl Frontend {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build the shared state: Redis pool and templates.
    ///
    /// Nothing is dialed here; the first request opens the first connection.
    pub fn state(&self) -> Result<AppState> {
        let connector = RedisConnector::for_host(&self.config.redis_host, self.config.redis_port)?;
        let client = KvClient::with_connector(
            Arc::new(connector),
            PoolConfig::from(&self.config.pool),
        );
        let views = Views::load(&self.config.views_dir)?;
        tracing::info!("  Templates: {}", views.len());
        Ok(AppState::new(client, views))
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting kvgate");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Store: {}", self.config.redis_url());
        tracing::info!(
            "  Pool: max_idle={} idle_timeout={}s",
            self.config.pool.max_idle,
            self.config.pool.idle_timeout_secs
        );
        tracing::info!("  Views: {}", self.config.views_dir.display());

        let router = create_router(self.state()?);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ kvgate ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("kvgate stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::warn!("Received SIGTERM, shutting down");
        }
    }
}
