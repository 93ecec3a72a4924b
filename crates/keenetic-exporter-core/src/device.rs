//! Static device list.
//!
//! The list is loaded once at startup from a JSON array of
//! `{name, ip, username, password}` descriptors and is read-only afterwards.
//! The `ip` value is the stable key of a device and doubles as the
//! `device_ip` label on every exported series.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// RCI resource that reports memory, CPU load, uptime and connection counts.
pub const STATUS_PATH: &str = "/rci/show/system";

/// HTTP basic-auth credentials for one device.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Login password
    pub password: String,
}

impl Credentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity and access details of one polled device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Stable key, unique across the list (the configured `ip`)
    pub id: String,
    /// Human-readable name, exported as `device_name`
    pub name: String,
    /// Host, `host:port` or full status URL
    pub address: String,
    /// Basic-auth credentials
    pub credentials: Credentials,
}

impl DeviceConfig {
    /// Create a device whose key and address are both `ip`.
    #[must_use]
    pub fn new(name: impl Into<String>, ip: impl Into<String>, credentials: Credentials) -> Self {
        let ip = ip.into();
        Self {
            id: ip.clone(),
            name: name.into(),
            address: ip,
            credentials,
        }
    }

    /// Resolve the URL the status request is sent to.
    ///
    /// A full `http://` or `https://` address is used verbatim; anything
    /// else is taken as a host and pointed at [`STATUS_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if no valid URL can be built.
    pub fn status_url(&self) -> Result<Url, ConfigError> {
        let raw = if self.address.starts_with("http://") || self.address.starts_with("https://") {
            self.address.clone()
        } else {
            format!("http://{}{STATUS_PATH}", self.address.trim_end_matches('/'))
        };

        let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidAddress {
            id: self.id.clone(),
            reason: e.to_string(),
        })?;

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidAddress {
                id: self.id.clone(),
                reason: "missing host".to_string(),
            });
        }

        Ok(url)
    }
}

/// On-disk shape of one device entry.
#[derive(Debug, Deserialize)]
struct DeviceDescriptor {
    name: String,
    ip: String,
    username: String,
    password: String,
}

/// Parse and validate a JSON device list.
///
/// # Errors
///
/// Returns error if the document is not a list of descriptors, a name or
/// ip is empty, an ip is repeated, or an address cannot form a URL.
pub fn parse_devices(json: &str) -> Result<Vec<DeviceConfig>, ConfigError> {
    let descriptors: Vec<DeviceDescriptor> =
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut devices = Vec::with_capacity(descriptors.len());

    for (index, desc) in descriptors.into_iter().enumerate() {
        if desc.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                index,
                field: "name",
            });
        }
        if desc.ip.trim().is_empty() {
            return Err(ConfigError::MissingField { index, field: "ip" });
        }
        if !seen.insert(desc.ip.clone()) {
            return Err(ConfigError::DuplicateId(desc.ip));
        }

        let device = DeviceConfig::new(
            desc.name,
            desc.ip,
            Credentials::new(desc.username, desc.password),
        );
        device.status_url()?;
        devices.push(device);
    }

    if devices.is_empty() {
        tracing::warn!("Device list is empty, nothing will be polled");
    }

    Ok(devices)
}

/// Read and validate the device list at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse_devices`].
pub fn load_devices(path: &Path) -> Result<Vec<DeviceConfig>, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let devices = parse_devices(&json)?;
    tracing::debug!(path = %path.display(), count = devices.len(), "Loaded device list");
    Ok(devices)
}

/// Errors raised while loading the device list.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read device list {}: {source}", path.display())]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// Document is not a valid device list
    #[error("malformed device list: {0}")]
    Parse(String),
    /// A required field is empty
    #[error("device #{index}: field `{field}` must not be empty")]
    MissingField {
        /// Position in the list
        index: usize,
        /// Offending field
        field: &'static str,
    },
    /// Two entries share the same ip
    #[error("duplicate device ip: {0}")]
    DuplicateId(String),
    /// Address cannot be turned into a request URL
    #[error("device {id}: invalid address: {reason}")]
    InvalidAddress {
        /// Device key
        id: String,
        /// Parser message
        reason: String,
    },
}
