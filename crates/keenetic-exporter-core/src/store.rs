//! Shared cache of the latest metrics per device.
//!
//! The set of devices is fixed when the store is built, so the index needs
//! no lock. Each record's metrics sit behind an [`ArcSwap`]: a write
//! publishes a whole new `DeviceMetrics` in one atomic pointer swap, and a
//! reader sees either the old reading or the new one, never a mix.

use crate::device::DeviceConfig;
use crate::metrics::DeviceMetrics;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// One device as seen by a scrape.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    /// Configured identity, shared with the device list
    pub config: Arc<DeviceConfig>,
    /// Reading at snapshot time
    pub metrics: Arc<DeviceMetrics>,
}

#[derive(Debug)]
struct Slot {
    config: Arc<DeviceConfig>,
    metrics: ArcSwap<DeviceMetrics>,
}

/// Per-device metrics cache written by pollers and read by scrapes.
#[derive(Debug)]
pub struct DeviceStateStore {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl DeviceStateStore {
    /// Seed a store with one all-unknown record per device.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateDevice`] if two devices share an id.
    pub fn new<I>(devices: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Arc<DeviceConfig>>,
    {
        let mut slots = Vec::new();
        let mut index = HashMap::new();

        for config in devices {
            if index.contains_key(&config.id) {
                return Err(StoreError::DuplicateDevice(config.id.clone()));
            }
            index.insert(config.id.clone(), slots.len());
            slots.push(Slot {
                config,
                metrics: ArcSwap::from_pointee(DeviceMetrics::unknown()),
            });
        }

        Ok(Self { slots, index })
    }

    /// Replace the metrics of one device.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownDevice`] if `device_id` was not seeded.
    pub fn write(&self, device_id: &str, metrics: DeviceMetrics) -> Result<(), StoreError> {
        let slot = self.slot(device_id)?;
        slot.metrics.store(Arc::new(metrics));
        Ok(())
    }

    /// Reset one device to all-unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownDevice`] if `device_id` was not seeded.
    pub fn reset(&self, device_id: &str) -> Result<(), StoreError> {
        self.write(device_id, DeviceMetrics::unknown())
    }

    /// Current record of one device.
    #[must_use]
    pub fn get(&self, device_id: &str) -> Option<DeviceRecord> {
        self.slot(device_id).ok().map(Slot::record)
    }

    /// Every record, in configuration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeviceRecord> {
        self.slots.iter().map(Slot::record).collect()
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no devices are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, device_id: &str) -> Result<&Slot, StoreError> {
        self.index
            .get(device_id)
            .and_then(|i| self.slots.get(*i))
            .ok_or_else(|| StoreError::UnknownDevice(device_id.to_string()))
    }
}

impl Slot {
    fn record(&self) -> DeviceRecord {
        DeviceRecord {
            config: Arc::clone(&self.config),
            metrics: self.metrics.load_full(),
        }
    }
}

/// Errors returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the id
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    /// Id seeded twice
    #[error("duplicate device: {0}")]
    DuplicateDevice(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Credentials;
    use crate::metrics::FieldMap;

    fn device(name: &str, ip: &str) -> Arc<DeviceConfig> {
        Arc::new(DeviceConfig::new(name, ip, Credentials::new("admin", "pw")))
    }

    fn reading(mem_free: f64) -> DeviceMetrics {
        DeviceMetrics::from_fields(&FieldMap::from([
            ("memfree".to_string(), mem_free),
            ("memtotal".to_string(), 2.0 * mem_free),
        ]))
    }

    #[test]
    fn seeded_records_are_unknown() {
        let store = DeviceStateStore::new([device("R1", "10.0.0.1"), device("R2", "10.0.0.2")])
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|r| r.metrics.is_unknown()));
        assert_eq!(snapshot[0].config.name, "R1");
        assert_eq!(snapshot[1].config.name, "R2");
    }

    #[test]
    fn write_replaces_whole_reading() {
        let store = DeviceStateStore::new([device("R1", "10.0.0.1")]).unwrap();

        store.write("10.0.0.1", reading(100.0)).unwrap();
        let only_cpu =
            DeviceMetrics::from_fields(&FieldMap::from([("cpuload".to_string(), 0.25)]));
        store.write("10.0.0.1", only_cpu).unwrap();

        let record = store.get("10.0.0.1").unwrap();
        assert_eq!(record.metrics.cpu_load, Some(0.25));
        assert_eq!(record.metrics.mem_free, None);
        assert_eq!(record.metrics.mem_total, None);
    }

    #[test]
    fn reset_keeps_identity() {
        let store = DeviceStateStore::new([device("R1", "10.0.0.1")]).unwrap();
        store.write("10.0.0.1", reading(100.0)).unwrap();

        store.reset("10.0.0.1").unwrap();

        let record = store.get("10.0.0.1").unwrap();
        assert!(record.metrics.is_unknown());
        assert_eq!(record.config.name, "R1");
    }

    #[test]
    fn unknown_device_rejected() {
        let store = DeviceStateStore::new([device("R1", "10.0.0.1")]).unwrap();
        let err = store.write("10.0.0.9", reading(1.0)).unwrap_err();
        assert_eq!(err, StoreError::UnknownDevice("10.0.0.9".to_string()));
        assert!(store.get("10.0.0.9").is_none());
    }

    #[test]
    fn duplicate_device_rejected() {
        let err = DeviceStateStore::new([device("R1", "10.0.0.1"), device("R1b", "10.0.0.1")])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateDevice("10.0.0.1".to_string()));
    }

    #[test]
    fn snapshot_is_not_affected_by_later_writes() {
        let store = DeviceStateStore::new([device("R1", "10.0.0.1")]).unwrap();
        store.write("10.0.0.1", reading(100.0)).unwrap();

        let snapshot = store.snapshot();
        store.reset("10.0.0.1").unwrap();

        assert_eq!(snapshot[0].metrics.mem_free, Some(100.0));
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let store = Arc::new(
            DeviceStateStore::new([device("A", "10.0.0.1"), device("B", "10.0.0.2")]).unwrap(),
        );
        store.write("10.0.0.2", reading(7.0)).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    let value = f64::from(i);
                    store.write("10.0.0.1", reading(value)).unwrap();
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    for record in store.snapshot() {
                        let m = record.metrics;
                        if record.config.id == "10.0.0.2" {
                            assert_eq!(m.mem_free, Some(7.0));
                        }
                        // Both fields come from the same write.
                        if let (Some(free), Some(total)) = (m.mem_free, m.mem_total) {
                            assert!((total - 2.0 * free).abs() < f64::EPSILON);
                        } else {
                            assert!(m.is_unknown());
                        }
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
