//! # Keenetic Exporter Core
//!
//! Shared model for the exporter: the static device list, the per-device
//! metrics cache that pollers write and scrapes read, and rendering of a
//! cache snapshot into the Prometheus text exposition format.
//!
//! This crate provides:
//! - Device configuration loading and validation
//! - `DeviceMetrics` with explicit "unknown" values
//! - A lock-free store with atomic per-record replacement
//! - Snapshot rendering for the `/metrics` endpoint

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod exposition;
pub mod metrics;
pub mod store;

pub use device::{load_devices, parse_devices, ConfigError, Credentials, DeviceConfig};
pub use exposition::{render, CONTENT_TYPE};
pub use metrics::{DeviceMetrics, FieldMap, MetricField};
pub use store::{DeviceRecord, DeviceStateStore, StoreError};
