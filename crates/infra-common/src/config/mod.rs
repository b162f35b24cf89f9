//! Layered configuration loading.
//!
//! Sources are applied in order, later ones winning:
//!
//! 1. the `#[serde(default)]` values of the target struct
//! 2. an optional TOML file
//! 3. environment variables named `<PREFIX>_<KEY>`, with `__` separating
//!    nested keys (`CCAPI_DISCOVERY__MAX_ATTEMPTS=5`)

use std::fs;
use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::types::{Error, Result};

/// Environment prefix used by the CCAPI tools
pub const ENV_PREFIX: &str = "CCAPI";

/// Loads `T` from an optional TOML file and the environment.
///
/// A `path` that is given but does not exist is an error.
pub fn load_config<T: DeserializeOwned>(path: Option<&Path>, env_prefix: &str) -> Result<T> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!("Loading configuration from {}", path.display());
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    let loaded = builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(loaded.try_deserialize()?)
}

/// Writes `value` as TOML, creating parent directories as needed.
pub fn write_config<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let rendered = toml::to_string_pretty(value)?;
    fs::write(path, rendered)?;
    Ok(())
}
