//! Discover command - find cameras via SSDP

use std::time::Duration;

use anyhow::Result;
use ccapi_client_core::ClientConfig;
use ccapi_discovery_core::{DiscoveryEngine, DiscoveryEvent, DiscoveryStatus};
use colored::Colorize;

use super::ctrl_c_token;
use crate::output::device_table;

pub async fn execute(
    config: &ClientConfig,
    json: bool,
    attempts: Option<u32>,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let mut discovery = config.discovery.clone();
    if let Some(attempts) = attempts {
        discovery = discovery.with_max_attempts(attempts);
    }
    if let Some(timeout_ms) = timeout_ms {
        discovery = discovery.with_receive_timeout(Duration::from_millis(timeout_ms));
    }

    let (mut engine, mut events) = DiscoveryEngine::new(discovery)?;

    // Progress goes to stderr so --json output stays clean
    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if json {
                continue;
            }
            match event {
                DiscoveryEvent::ProbeSent { attempt } => {
                    eprintln!("{} probe {} sent", "→".dimmed(), attempt);
                }
                DiscoveryEvent::DeviceFound(device) => {
                    eprintln!(
                        "{} found {} at {}",
                        "✓".green(),
                        device.display_name().bold(),
                        device.source_ip
                    );
                }
                DiscoveryEvent::ResolveFailed { location, error } => {
                    eprintln!("{} {}: {}", "✗".yellow(), location, error);
                }
                DiscoveryEvent::Finished(_) => break,
            }
        }
    });

    let report = engine.discover(ctrl_c_token()).await?;
    drop(engine);
    let _ = progress.await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match report.status {
        DiscoveryStatus::NoDevicesFound => println!("{}", report.status.to_string().yellow()),
        DiscoveryStatus::Cancelled if report.devices.is_empty() => {
            println!("{}", report.status.to_string().yellow())
        }
        _ => println!("{}", device_table(&report.devices)),
    }
    Ok(())
}
