//! # Keenetic Exporter
//!
//! Polls Keenetic routers for system status and serves the latest values
//! on `/metrics` for Prometheus.

use anyhow::{Context, Result};
use keenetic_exporter_agent::{Exporter, ExporterConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Keenetic exporter"
    );

    // Load configuration
    let config = ExporterConfig::from_env()?;
    let devices = config.load_devices().context("Failed to load device list")?;

    tracing::info!(
        devices = devices.len(),
        path = %config.devices_path.display(),
        "Device list loaded"
    );

    let exporter = Exporter::new(config, devices)?;

    exporter.run().await?;

    Ok(())
}
