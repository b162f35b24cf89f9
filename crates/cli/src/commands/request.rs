//! Raw GET / PUT against a control API path

use anyhow::{Context, Result};
use ccapi_client_core::ClientConfig;
use serde_json::Value;

use super::connect;

pub async fn get(config: &ClientConfig, path: &str) -> Result<()> {
    let client = connect(config).await?;
    let body: Value = client
        .get_json(path)
        .await
        .with_context(|| format!("GET {} failed", path))?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub async fn put(config: &ClientConfig, path: &str, body: &str) -> Result<()> {
    let body: Value = serde_json::from_str(body).context("Request body is not valid JSON")?;

    let client = connect(config).await?;
    let response: Value = client
        .put_json(path, &body)
        .await
        .with_context(|| format!("PUT {} failed", path))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
