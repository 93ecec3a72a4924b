//! Fetcher contract shared by the RCI client and test doubles.

use keenetic_exporter_core::{DeviceConfig, FieldMap};
use std::future::Future;

/// One status read of one device.
///
/// Implementations perform a single request with no retry; the poller's
/// fixed interval is the retry policy.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetch and decode the current status of `device`.
    fn fetch(
        &self,
        device: &DeviceConfig,
    ) -> impl Future<Output = Result<FieldMap, FetchError>> + Send;
}

/// Errors that can occur while fetching a device status.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    ClientInit(String),
    /// Device address cannot be requested
    #[error("invalid address: {0}")]
    Address(String),
    /// Connection, TLS or timeout failure
    #[error("request error: {0}")]
    Request(String),
    /// Device answered with a status other than 200
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Body is not a JSON object
    #[error("decode error: {0}")]
    Decode(String),
}
