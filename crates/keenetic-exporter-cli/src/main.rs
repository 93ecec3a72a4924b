//! # Keenetic Exporter CLI
//!
//! Command-line utilities for checking device lists and polling routers once.

use anyhow::{bail, Context, Result};
use keenetic_exporter_adapter_rci::{Fetcher, RciClient, RciClientConfig};
use keenetic_exporter_core::{load_devices, DeviceConfig, DeviceMetrics, MetricField};
use std::env;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "check-config" => {
            if args.len() < 3 {
                eprintln!("Usage: keenetic-exporter-cli check-config <path>");
                std::process::exit(1);
            }
            check_config(Path::new(&args[2]))?;
        }
        "fetch" => {
            if args.len() < 3 {
                eprintln!("Usage: keenetic-exporter-cli fetch <path> [<ip>]");
                std::process::exit(1);
            }
            fetch_status(Path::new(&args[2]), args.get(3).map(String::as_str)).await?;
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let devices = load_devices(path).context("Invalid device list")?;

    for device in &devices {
        let url = device.status_url()?;
        println!("{}\t{}\t{url}", device.name, device.id);
    }
    println!("{} device(s) OK", devices.len());

    Ok(())
}

async fn fetch_status(path: &Path, only: Option<&str>) -> Result<()> {
    let devices = load_devices(path).context("Invalid device list")?;
    let selected: Vec<&DeviceConfig> = devices
        .iter()
        .filter(|d| only.map_or(true, |id| d.id == id))
        .collect();

    if selected.is_empty() {
        bail!("no device matches {}", only.unwrap_or("<all>"));
    }

    let client = RciClient::new(&RciClientConfig::default())?;
    let mut failures = 0;

    for device in selected {
        println!("{} ({})", device.name, device.id);
        match client.fetch(device).await {
            Ok(fields) => {
                let metrics = DeviceMetrics::from_fields(&fields);
                for field in MetricField::ALL {
                    println!(
                        "  {:<28} {}",
                        field.metric_name(),
                        metrics.gauge_value(field)
                    );
                }
            }
            Err(e) => {
                println!("  error: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} device(s) failed");
    }

    Ok(())
}

fn print_help() {
    println!(
        r"Keenetic Exporter CLI

USAGE:
    keenetic-exporter-cli <COMMAND> [OPTIONS]

COMMANDS:
    check-config <path>       Validate a device list and show request URLs
    fetch <path> [<ip>]       Fetch status once from every device (or one)
    help                      Show this help message

EXAMPLES:
    keenetic-exporter-cli check-config config.json
    keenetic-exporter-cli fetch config.json 192.168.1.1
"
    );
}
