//! # Keenetic Exporter Agent
//!
//! Service runtime for the exporter.
//!
//! ## Architecture
//!
//! The service runs two kinds of concurrent work:
//! 1. **Polling**: one task per device fetching status into the shared store
//! 2. **Serving**: an HTTP endpoint rendering the store on every scrape
//!
//! Scrapes only read the store, so a slow or dead device never delays them.

#![warn(clippy::all)]

pub mod config;
pub mod runtime;
pub mod server;

pub use config::ExporterConfig;
pub use runtime::Exporter;
pub use server::build_router;
