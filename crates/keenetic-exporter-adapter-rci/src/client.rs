//! HTTP client for the Keenetic RCI status resource.

use crate::fetcher::{FetchError, Fetcher};
use keenetic_exporter_core::{DeviceConfig, FieldMap, MetricField};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Longest response body kept in a [`FetchError::Status`].
pub const MAX_ERROR_BODY: usize = 256;

/// RCI client configuration.
#[derive(Debug, Clone)]
pub struct RciClientConfig {
    /// Per-request timeout, bounding how long one unreachable device
    /// can hold its poller
    pub timeout: Duration,
}

impl Default for RciClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Status fetcher shared by all pollers.
#[derive(Debug, Clone)]
pub struct RciClient {
    client: Client,
}

impl RciClient {
    /// Create a new RCI client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &RciClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| FetchError::ClientInit(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for RciClient {
    async fn fetch(&self, device: &DeviceConfig) -> Result<FieldMap, FetchError> {
        let url = device
            .status_url()
            .map_err(|e| FetchError::Address(e.to_string()))?;

        tracing::debug!(device_id = %device.id, %url, "GET device status");

        let response = self
            .client
            .get(url)
            .basic_auth(
                &device.credentials.username,
                Some(&device.credentials.password),
            )
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        decode_status(&value)
    }
}

/// Reduce a status document to the exported numeric fields.
///
/// Numbers are taken as-is and numeric strings are parsed. Absent, null
/// or non-numeric fields are left out, which the store records as unknown.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the document is not a JSON object.
pub fn decode_status(value: &Value) -> Result<FieldMap, FetchError> {
    let Value::Object(obj) = value else {
        return Err(FetchError::Decode(format!(
            "expected JSON object, got {}",
            kind(value)
        )));
    };

    let fields = MetricField::ALL
        .iter()
        .filter_map(|field| {
            let key = field.response_key();
            let number = match obj.get(key)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }?;
            Some((key.to_string(), number))
        })
        .collect();

    Ok(fields)
}

/// Cut `body` to at most [`MAX_ERROR_BODY`] bytes on a char boundary.
fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
