//! Exporter configuration.

use anyhow::{bail, Context, Result};
use keenetic_exporter_core::{load_devices, ConfigError, DeviceConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default scrape port.
pub const DEFAULT_PORT: u16 = 8758;

/// Exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// JSON device list
    pub devices_path: PathBuf,

    /// Address the `/metrics` endpoint listens on
    pub listen_addr: SocketAddr,

    /// Period between polls of one device
    pub poll_interval: Duration,

    /// Timeout of a single status request
    pub request_timeout: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            devices_path: PathBuf::from("config.json"),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            poll_interval: Duration::from_secs(15),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KEENETIC_EXPORTER_CONFIG`: device list path
    /// - `KEENETIC_EXPORTER_LISTEN`: listen IP address
    /// - `KEENETIC_EXPORTER_PORT`: listen port
    /// - `KEENETIC_EXPORTER_POLL_INTERVAL_SECS`: poll period in seconds
    /// - `KEENETIC_EXPORTER_TIMEOUT_SECS`: request timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("KEENETIC_EXPORTER_CONFIG") {
            config.devices_path = PathBuf::from(path);
        }

        if let Some(ip) = lookup("KEENETIC_EXPORTER_LISTEN") {
            let ip: IpAddr = ip
                .parse()
                .with_context(|| format!("Invalid KEENETIC_EXPORTER_LISTEN: {ip}"))?;
            config.listen_addr.set_ip(ip);
        }

        if let Some(port) = lookup("KEENETIC_EXPORTER_PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("Invalid KEENETIC_EXPORTER_PORT: {port}"))?;
            config.listen_addr.set_port(port);
        }

        if let Some(secs) = lookup("KEENETIC_EXPORTER_POLL_INTERVAL_SECS") {
            config.poll_interval = parse_secs("KEENETIC_EXPORTER_POLL_INTERVAL_SECS", &secs)?;
        }

        if let Some(secs) = lookup("KEENETIC_EXPORTER_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("KEENETIC_EXPORTER_TIMEOUT_SECS", &secs)?;
        }

        Ok(config)
    }

    /// Read the device list this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns error if the file is unreadable or malformed.
    pub fn load_devices(&self) -> Result<Vec<DeviceConfig>, ConfigError> {
        load_devices(&self.devices_path)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key}: {value}"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ExporterConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.devices_path, PathBuf::from("config.json"));
        assert_eq!(config.listen_addr.port(), 8758);
        assert!(config.listen_addr.ip().is_unspecified());
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn overrides() {
        let config = ExporterConfig::from_lookup(lookup(&[
            ("KEENETIC_EXPORTER_CONFIG", "/etc/keenetic/devices.json"),
            ("KEENETIC_EXPORTER_LISTEN", "127.0.0.1"),
            ("KEENETIC_EXPORTER_PORT", "9100"),
            ("KEENETIC_EXPORTER_POLL_INTERVAL_SECS", "30"),
            ("KEENETIC_EXPORTER_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(
            config.devices_path,
            PathBuf::from("/etc/keenetic/devices.json")
        );
        assert_eq!(config.listen_addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_port_rejected() {
        let err = ExporterConfig::from_lookup(lookup(&[("KEENETIC_EXPORTER_PORT", "70000")]))
            .unwrap_err();
        assert!(err.to_string().contains("KEENETIC_EXPORTER_PORT"));
    }

    #[test]
    fn zero_interval_rejected() {
        let result =
            ExporterConfig::from_lookup(lookup(&[("KEENETIC_EXPORTER_POLL_INTERVAL_SECS", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn missing_device_list_is_an_error() {
        let config = ExporterConfig {
            devices_path: PathBuf::from("/nonexistent/config.json"),
            ..Default::default()
        };
        assert!(matches!(config.load_devices(), Err(ConfigError::Io { .. })));
    }
}
