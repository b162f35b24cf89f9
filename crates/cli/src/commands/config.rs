//! Config command - manage the configuration file

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use ccapi_client_core::ClientConfig;
use ccapi_infra_common::write_config;
use colored::Colorize;

pub fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.ok_or_else(|| anyhow!("No configuration directory available, pass --config"))?;
    if path.exists() && !force {
        bail!(
            "{} already exists, use --force to overwrite it",
            path.display()
        );
    }

    write_config(&path, &ClientConfig::default())?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

pub fn path(path: Option<PathBuf>) -> Result<()> {
    match path {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", "No configuration directory available".yellow()),
    }
    Ok(())
}

pub fn show(config: &ClientConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&redacted(config))?);
    Ok(())
}

fn redacted(config: &ClientConfig) -> ClientConfig {
    let mut shown = config.clone();
    if !shown.password.is_empty() {
        shown.password = "<redacted>".to_string();
    }
    shown
}
