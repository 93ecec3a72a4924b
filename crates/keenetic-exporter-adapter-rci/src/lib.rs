//! # Keenetic RCI Adapter
//!
//! Status polling for Keenetic routers over the RCI HTTP API.
//!
//! ## Fetching
//!
//! Each poll is one basic-auth `GET` of the device's system status
//! resource. The JSON body is reduced to the numeric fields the exporter
//! publishes; anything else in the response is ignored.
//!
//! ## Polling
//!
//! Every device gets its own long-lived task that fetches on a fixed
//! interval and replaces the device's record in the shared store. A
//! failed fetch resets the record to unknown and the loop carries on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod fetcher;
pub mod poller;

pub use client::{decode_status, RciClient, RciClientConfig};
pub use fetcher::{FetchError, Fetcher};
pub use poller::{DevicePoller, PollState, PollerSet};
