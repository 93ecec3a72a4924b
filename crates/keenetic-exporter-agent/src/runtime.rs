//! Exporter runtime orchestration.

use crate::config::ExporterConfig;
use crate::server::build_router;
use anyhow::{Context, Result};
use keenetic_exporter_adapter_rci::{Fetcher, PollerSet, RciClient, RciClientConfig};
use keenetic_exporter_core::{DeviceConfig, DeviceStateStore};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The exporter service: device pollers plus the scrape endpoint.
pub struct Exporter<F = RciClient> {
    config: ExporterConfig,
    store: Arc<DeviceStateStore>,
    fetcher: Arc<F>,
}

impl Exporter<RciClient> {
    /// Create an exporter that polls devices over RCI.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built or device ids repeat.
    pub fn new(config: ExporterConfig, devices: Vec<DeviceConfig>) -> Result<Self> {
        let client = RciClient::new(&RciClientConfig {
            timeout: config.request_timeout,
        })
        .context("Failed to create RCI client")?;

        Self::with_fetcher(config, devices, client)
    }
}

impl<F: Fetcher> Exporter<F> {
    /// Create an exporter with a custom fetcher.
    ///
    /// # Errors
    ///
    /// Returns error if device ids repeat.
    pub fn with_fetcher(
        config: ExporterConfig,
        devices: Vec<DeviceConfig>,
        fetcher: F,
    ) -> Result<Self> {
        let store = DeviceStateStore::new(devices.into_iter().map(Arc::new))
            .context("Failed to initialize device store")?;

        Ok(Self {
            config,
            store: Arc::new(store),
            fetcher: Arc::new(fetcher),
        })
    }

    /// Shared device store.
    #[must_use]
    pub fn store(&self) -> Arc<DeviceStateStore> {
        Arc::clone(&self.store)
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound or the server fails.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.listen_addr))?;

        self.serve(listener, shutdown_signal()).await
    }

    /// Start pollers and serve scrapes on `listener` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns error if the server fails.
    pub async fn serve<S>(self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            devices = self.store.len(),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Starting exporter runtime"
        );

        let pollers = PollerSet::spawn_all(&self.store, &self.fetcher, self.config.poll_interval);

        let addr = listener.local_addr().context("Listener has no local address")?;
        tracing::info!(%addr, "Serving metrics on http://{addr}/metrics");

        let app = build_router(Arc::clone(&self.store));
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Metrics server failed");

        {
            let exited = pollers.finished();
            if !exited.is_empty() {
                tracing::warn!(devices = ?exited, "Pollers exited before shutdown");
            }
        }
        pollers.shutdown().await;

        tracing::info!("Exporter stopped");
        served
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
