use keenetic_exporter_adapter_rci::{FetchError, Fetcher};
use keenetic_exporter_agent::{Exporter, ExporterConfig};
use keenetic_exporter_core::{parse_devices, DeviceConfig, FieldMap};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;

/// Router R1 always answers, router R2 always rejects the credentials.
struct FakeRouters;

impl Fetcher for FakeRouters {
    async fn fetch(&self, device: &DeviceConfig) -> Result<FieldMap, FetchError> {
        match device.id.as_str() {
            "10.0.0.1" => Ok(FieldMap::from([
                ("memfree".to_string(), 1000.0),
                ("cpuload".to_string(), 0.5),
            ])),
            _ => Err(FetchError::Status {
                status: 401,
                body: "Unauthorized".to_string(),
            }),
        }
    }
}

const DEVICES: &str = r#"[
    {"name": "R1", "ip": "10.0.0.1", "username": "admin", "password": "one"},
    {"name": "R2", "ip": "10.0.0.2", "username": "admin", "password": "two"}
]"#;

async fn scrape(base: &str, path: &str) -> (u16, String) {
    let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_polled_metrics_end_to_end() {
    let config = ExporterConfig {
        poll_interval: Duration::from_millis(50),
        ..Default::default()
    };
    let devices = parse_devices(DEVICES).unwrap();
    let exporter = Exporter::with_fetcher(config, devices, FakeRouters).unwrap();
    let store = exporter.store();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(exporter.serve(listener, async {
        let _ = stop_rx.await;
    }));

    timeout(Duration::from_secs(5), async {
        while store.get("10.0.0.1").unwrap().metrics.mem_free.is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("R1 was never polled");

    for _ in 0..5 {
        let (status, body) = scrape(&base, "/metrics").await;
        assert_eq!(status, 200);
        assert!(body
            .contains("keenetic_memory_free_kb{device_name=\"R1\",device_ip=\"10.0.0.1\"} 1000\n"));
        assert!(body.contains("keenetic_cpu_load{device_name=\"R1\",device_ip=\"10.0.0.1\"} 0.5\n"));
        assert!(body.contains(
            "keenetic_connections_total{device_name=\"R1\",device_ip=\"10.0.0.1\"} NaN\n"
        ));

        let r2_lines: Vec<_> = body
            .lines()
            .filter(|l| l.contains("device_ip=\"10.0.0.2\""))
            .collect();
        assert_eq!(r2_lines.len(), 8);
        assert!(r2_lines.iter().all(|l| l.ends_with(" NaN")));
        assert!(r2_lines.iter().all(|l| l.contains("device_name=\"R2\"")));

        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    let (status, body) = scrape(&base, "/status").await;
    assert_eq!(status, 404);
    assert_eq!(body, "Not Found");

    stop_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), server)
        .await
        .expect("exporter did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn duplicate_devices_rejected() {
    let devices = vec![
        DeviceConfig::new(
            "R1",
            "10.0.0.1",
            keenetic_exporter_core::Credentials::new("a", "b"),
        ),
        DeviceConfig::new(
            "R1 again",
            "10.0.0.1",
            keenetic_exporter_core::Credentials::new("a", "b"),
        ),
    ];

    let result = Exporter::with_fetcher(ExporterConfig::default(), devices, FakeRouters);
    assert!(result.is_err());
}
