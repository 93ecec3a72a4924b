//! Per-device telemetry values.

use std::collections::HashMap;

/// Numeric fields decoded from one status response, keyed by response name.
pub type FieldMap = HashMap<String, f64>;

/// The eight exported telemetry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    /// Free memory, KB
    MemFree,
    /// Total memory, KB
    MemTotal,
    /// Page cache, KB
    MemCache,
    /// Buffers, KB
    MemBuffers,
    /// One-minute CPU load
    CpuLoad,
    /// Seconds since boot
    Uptime,
    /// Free connection-table slots
    ConnFree,
    /// Connection-table size
    ConnTotal,
}

impl MetricField {
    /// Every field, in exposition order.
    pub const ALL: [MetricField; 8] = [
        MetricField::MemFree,
        MetricField::MemTotal,
        MetricField::MemCache,
        MetricField::MemBuffers,
        MetricField::CpuLoad,
        MetricField::Uptime,
        MetricField::ConnFree,
        MetricField::ConnTotal,
    ];

    /// Key of this field in the device status response.
    #[must_use]
    pub const fn response_key(self) -> &'static str {
        match self {
            MetricField::MemFree => "memfree",
            MetricField::MemTotal => "memtotal",
            MetricField::MemCache => "memcache",
            MetricField::MemBuffers => "membuffers",
            MetricField::CpuLoad => "cpuload",
            MetricField::Uptime => "uptime",
            MetricField::ConnFree => "connfree",
            MetricField::ConnTotal => "conntotal",
        }
    }

    /// Exported gauge name.
    #[must_use]
    pub const fn metric_name(self) -> &'static str {
        match self {
            MetricField::MemFree => "keenetic_memory_free_kb",
            MetricField::MemTotal => "keenetic_memory_total_kb",
            MetricField::MemCache => "keenetic_memory_cache_kb",
            MetricField::MemBuffers => "keenetic_memory_buffers_kb",
            MetricField::CpuLoad => "keenetic_cpu_load",
            MetricField::Uptime => "keenetic_uptime_seconds",
            MetricField::ConnFree => "keenetic_connections_free",
            MetricField::ConnTotal => "keenetic_connections_total",
        }
    }

    /// Gauge help text.
    #[must_use]
    pub const fn help(self) -> &'static str {
        match self {
            MetricField::MemFree => "Free memory in KB",
            MetricField::MemTotal => "Total memory in KB",
            MetricField::MemCache => "Memory cache in KB",
            MetricField::MemBuffers => "Memory buffers in KB",
            MetricField::CpuLoad => "CPU Load (1 min)",
            MetricField::Uptime => "System uptime in seconds",
            MetricField::ConnFree => "Free connections",
            MetricField::ConnTotal => "Total connections",
        }
    }
}

/// Latest known reading of one device.
///
/// `None` means unknown: never fetched, absent from the last response, or
/// the last fetch failed. Unknown values are exported as `NaN`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceMetrics {
    /// Free memory, KB
    pub mem_free: Option<f64>,
    /// Total memory, KB
    pub mem_total: Option<f64>,
    /// Page cache, KB
    pub mem_cache: Option<f64>,
    /// Buffers, KB
    pub mem_buffers: Option<f64>,
    /// One-minute CPU load
    pub cpu_load: Option<f64>,
    /// Seconds since boot
    pub uptime_seconds: Option<f64>,
    /// Free connection-table slots
    pub conn_free: Option<f64>,
    /// Connection-table size
    pub conn_total: Option<f64>,
}

impl DeviceMetrics {
    /// All fields unknown.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            mem_free: None,
            mem_total: None,
            mem_cache: None,
            mem_buffers: None,
            cpu_load: None,
            uptime_seconds: None,
            conn_free: None,
            conn_total: None,
        }
    }

    /// Build a full reading from decoded fields. Fields not present are unknown.
    #[must_use]
    pub fn from_fields(fields: &FieldMap) -> Self {
        let get = |field: MetricField| fields.get(field.response_key()).copied();
        Self {
            mem_free: get(MetricField::MemFree),
            mem_total: get(MetricField::MemTotal),
            mem_cache: get(MetricField::MemCache),
            mem_buffers: get(MetricField::MemBuffers),
            cpu_load: get(MetricField::CpuLoad),
            uptime_seconds: get(MetricField::Uptime),
            conn_free: get(MetricField::ConnFree),
            conn_total: get(MetricField::ConnTotal),
        }
    }

    /// Value of one field.
    #[must_use]
    pub const fn get(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::MemFree => self.mem_free,
            MetricField::MemTotal => self.mem_total,
            MetricField::MemCache => self.mem_cache,
            MetricField::MemBuffers => self.mem_buffers,
            MetricField::CpuLoad => self.cpu_load,
            MetricField::Uptime => self.uptime_seconds,
            MetricField::ConnFree => self.conn_free,
            MetricField::ConnTotal => self.conn_total,
        }
    }

    /// Value of one field as exported, with unknown mapped to `NaN`.
    #[must_use]
    pub fn gauge_value(&self, field: MetricField) -> f64 {
        self.get(field).unwrap_or(f64::NAN)
    }

    /// True when no field holds a value.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        MetricField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}
