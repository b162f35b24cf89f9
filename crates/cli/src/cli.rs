use std::path::PathBuf;

use anyhow::{Context, Result};
use ccapi_client_core::ClientConfig;
use ccapi_infra_common::{parse_log_level, setup_logging, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::commands;

#[derive(Parser, Debug)]
#[command(
    name = "ccapi",
    version,
    about = "Discover and control cameras over the Camera Control API"
)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/ccapi/config.toml when present)
    #[arg(long, global = true, env = "CCAPI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Digest username, overrides the configuration
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Digest password, overrides the configuration
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Control API base URL, e.g. https://192.168.1.2:443/ccapi.
    /// Without one, the first discovered camera is used.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find cameras on the local network
    Discover {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Number of M-SEARCH probes
        #[arg(long)]
        attempts: Option<u32>,

        /// Listening window after each probe, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// GET a control API path, e.g. ver100/deviceinformation
    Get { path: String },

    /// PUT a JSON body to a control API path
    Put { path: String, body: String },

    /// Read or change a shooting setting (iso, tv, av, exposure, wb, ...)
    Setting {
        #[command(subcommand)]
        action: SettingAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingAction {
    Get { name: String },
    Set { name: String, value: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let level = parse_log_level(&self.log_level)?;
        let mut logging = LoggingConfig::new(level, "ccapi");
        if self.json_logs {
            logging = logging.with_json();
        }
        setup_logging(logging)?;

        let config_path = self.config_path();

        if let Commands::Config { action } = &self.command {
            return match action {
                ConfigAction::Init { force } => commands::config::init(config_path, *force),
                ConfigAction::Path => commands::config::path(config_path),
                ConfigAction::Show => commands::config::show(&self.load_config(config_path)?),
            };
        }

        let config = self.load_config(config_path)?;
        match self.command {
            Commands::Discover {
                json,
                attempts,
                timeout_ms,
            } => commands::discover::execute(&config, json, attempts, timeout_ms).await,
            Commands::Get { path } => commands::request::get(&config, &path).await,
            Commands::Put { path, body } => commands::request::put(&config, &path, &body).await,
            Commands::Setting { action } => match action {
                SettingAction::Get { name } => commands::setting::get(&config, &name).await,
                SettingAction::Set { name, value } => {
                    commands::setting::set(&config, &name, &value).await
                }
            },
            Commands::Config { .. } => Ok(()),
        }
    }

    /// `--config`, else the default location.
    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("ccapi").join("config.toml")))
    }

    fn load_config(&self, path: Option<PathBuf>) -> Result<ClientConfig> {
        // Only an explicit --config has to exist
        let path = path.filter(|p| self.config.is_some() || p.exists());
        debug!(path = ?path, "Loading configuration");

        let mut config = ClientConfig::load(path.as_deref()).context("Failed to load configuration")?;
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        config.validate()?;
        Ok(config)
    }
}
