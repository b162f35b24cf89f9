//! Setting command - read or change a single shooting setting

use anyhow::{Context, Result};
use ccapi_client_core::{settings::setting_endpoint, ClientConfig};
use colored::Colorize;

use super::connect;
use crate::output::setting_summary;

pub async fn get(config: &ClientConfig, name: &str) -> Result<()> {
    let endpoint = setting_endpoint(name);
    let client = connect(config).await?;

    let setting = client
        .get_setting(&endpoint)
        .await
        .with_context(|| format!("Failed to read {}", name))?;
    println!("{}", setting_summary(name, &setting));
    Ok(())
}

pub async fn set(config: &ClientConfig, name: &str, value: &str) -> Result<()> {
    let endpoint = setting_endpoint(name);
    let client = connect(config).await?;

    let setting = client
        .put_setting(&endpoint, value)
        .await
        .with_context(|| format!("Failed to set {} to {}", name, value))?;
    println!("{} {}", "✓".green(), setting_summary(name, &setting));
    Ok(())
}
