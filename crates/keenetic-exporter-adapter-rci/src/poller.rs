//! Per-device polling loop.

use crate::fetcher::Fetcher;
use keenetic_exporter_core::{DeviceConfig, DeviceMetrics, DeviceStateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Outcome of the most recent poll of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Last fetch succeeded
    Healthy,
    /// Last fetch failed; the device's metrics are unknown
    Degraded,
}

/// Polls one device and keeps its record in the store current.
pub struct DevicePoller<F> {
    device: Arc<DeviceConfig>,
    store: Arc<DeviceStateStore>,
    fetcher: Arc<F>,
    interval: Duration,
    state: Option<PollState>,
}

impl<F: Fetcher> DevicePoller<F> {
    /// Create a poller for `device`.
    #[must_use]
    pub fn new(
        device: Arc<DeviceConfig>,
        store: Arc<DeviceStateStore>,
        fetcher: Arc<F>,
        interval: Duration,
    ) -> Self {
        Self {
            device,
            store,
            fetcher,
            interval,
            state: None,
        }
    }

    /// State after the last poll, `None` before the first one.
    #[must_use]
    pub fn state(&self) -> Option<PollState> {
        self.state
    }

    /// Fetch once and write the result to the store.
    ///
    /// A success replaces the whole record; fields missing from the
    /// response become unknown. A failure resets the record to unknown.
    pub async fn poll_once(&mut self) -> PollState {
        let device_id = self.device.id.as_str();

        let (metrics, state) = match self.fetcher.fetch(&self.device).await {
            Ok(fields) => {
                tracing::debug!(device_id = %device_id, fields = fields.len(), "Poll succeeded");
                (DeviceMetrics::from_fields(&fields), PollState::Healthy)
            }
            Err(e) => {
                tracing::error!(
                    device_id = %device_id,
                    device_name = %self.device.name,
                    error = %e,
                    "Error updating device"
                );
                (DeviceMetrics::unknown(), PollState::Degraded)
            }
        };

        if let Err(e) = self.store.write(device_id, metrics) {
            tracing::warn!(device_id = %device_id, error = %e, "Store rejected poll result");
        }

        if self.state == Some(PollState::Degraded) && state == PollState::Healthy {
            tracing::info!(device_id = %device_id, device_name = %self.device.name, "Device recovered");
        }
        self.state = Some(state);
        state
    }

    /// Run the loop on its own task: poll immediately, then once per interval.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tracing::debug!(
            device_id = %self.device.id,
            interval_secs = self.interval.as_secs_f64(),
            "Poller started"
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Handles of all running pollers.
#[derive(Debug, Default)]
pub struct PollerSet {
    handles: Vec<(String, JoinHandle<()>)>,
}

impl PollerSet {
    /// Spawn one poller per device in the store, all sharing `fetcher`.
    #[must_use]
    pub fn spawn_all<F: Fetcher>(
        store: &Arc<DeviceStateStore>,
        fetcher: &Arc<F>,
        interval: Duration,
    ) -> Self {
        let handles = store
            .snapshot()
            .into_iter()
            .map(|record| {
                let id = record.config.id.clone();
                let poller = DevicePoller::new(
                    record.config,
                    Arc::clone(store),
                    Arc::clone(fetcher),
                    interval,
                );
                (id, poller.spawn())
            })
            .collect();

        Self { handles }
    }

    /// Number of pollers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True if no pollers are running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Ids of devices whose poller task has exited.
    #[must_use]
    pub fn finished(&self) -> Vec<&str> {
        self.handles
            .iter()
            .filter(|(_, h)| h.is_finished())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Abort every poller; in-flight fetches are dropped.
    pub async fn shutdown(self) {
        for (_, handle) in &self.handles {
            handle.abort();
        }
        for (id, handle) in self.handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(device_id = %id, error = %e, "Poller ended abnormally");
                }
            }
        }
    }
}
