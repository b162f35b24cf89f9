//! Subcommand implementations

pub mod config;
pub mod discover;
pub mod request;
pub mod setting;

use anyhow::{anyhow, Result};
use ccapi_client_core::{CameraClient, CancellationToken, ClientConfig};
use tracing::info;

/// Cancellation token that fires on Ctrl-C.
pub fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            trigger.cancel();
        }
    });
    cancel
}

/// Client for the configured base URL, or for the first discovered camera.
pub async fn connect(config: &ClientConfig) -> Result<CameraClient> {
    if config.base_url.is_some() {
        return Ok(CameraClient::new(config)?);
    }

    eprintln!("No base URL configured, searching for a camera...");
    CameraClient::discover(config, ctrl_c_token())
        .await?
        .ok_or_else(|| anyhow!("No cameras found. Make sure the camera is on the same network and the control API is enabled"))
}
