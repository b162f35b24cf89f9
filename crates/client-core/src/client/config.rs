//! Client configuration
//!
//! [`ClientConfig`] gathers everything needed to talk to one camera: the
//! credentials, where the control API lives, the authentication retry
//! policy, HTTP transport settings and the discovery parameters used when
//! the camera address is not known up front.
//!
//! # Sources
//!
//! ```text
//! ┌──────────────────────┐
//! │ ClientConfig default │  ver100, 3 retries, 30 s timeout
//! ├──────────────────────┤
//! │ config.toml          │  username, password, base_url, [discovery]
//! ├──────────────────────┤
//! │ CCAPI_* environment  │  CCAPI_PASSWORD, CCAPI_DISCOVERY__MAX_ATTEMPTS
//! └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use ccapi_client_core::ClientConfig;
//!
//! let config = ClientConfig::new()
//!     .with_credentials("admin", "canon")
//!     .with_base_url("https://192.168.1.2:443/ccapi")
//!     .with_max_auth_retries(5);
//!
//! assert_eq!(config.api_version, "ver100");
//! assert_eq!(config.auth_config().max_retries, 5);
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::path::Path;

use ccapi_auth_core::{AuthClientConfig, Credentials, HttpConfig, DEFAULT_MAX_RETRIES};
use ccapi_discovery_core::DiscoveryConfig;
use ccapi_infra_common::{load_config, ENV_PREFIX};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

/// Default control API version prefix
pub const DEFAULT_API_VERSION: &str = "ver100";

/// API versions a camera may advertise
pub const SUPPORTED_API_VERSIONS: &[&str] = &["ver100", "ver110", "ver120", "ver130", "ver140"];

/// Configuration for a camera control client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Digest username
    pub username: String,
    /// Digest password
    pub password: String,
    /// Control API base URL, e.g. `https://192.168.1.2:443/ccapi`.
    /// When absent the camera has to be discovered first.
    pub base_url: Option<String>,
    /// Version segment prepended to setting endpoints
    pub api_version: String,
    /// Authenticated attempts per request before giving up
    pub max_auth_retries: u32,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
    /// Cameras serve self-signed certificates
    pub accept_invalid_certs: bool,
    /// SSDP discovery parameters
    pub discovery: DiscoveryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            username: String::new(),
            password: String::new(),
            base_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            max_auth_retries: DEFAULT_MAX_RETRIES,
            request_timeout_secs: 30,
            accept_invalid_certs: true,
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("max_auth_retries", &self.max_auth_retries)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("discovery", &self.discovery)
            .finish()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the configuration from an optional TOML file and `CCAPI_*`
    /// environment variables, then validates it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: ClientConfig = load_config(path, ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_max_auth_retries(mut self, max_auth_retries: u32) -> Self {
        self.max_auth_retries = max_auth_retries;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub fn auth_config(&self) -> AuthClientConfig {
        AuthClientConfig::default().with_max_retries(self.max_auth_retries)
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            request_timeout_secs: self.request_timeout_secs,
            accept_invalid_certs: self.accept_invalid_certs,
            ..HttpConfig::default()
        }
    }

    /// Checks the settings that would otherwise fail deep inside a request.
    pub fn validate(&self) -> Result<()> {
        if self.max_auth_retries == 0 {
            return Err(ClientError::Config(
                "max_auth_retries must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.api_version.is_empty() || self.api_version.contains('/') {
            return Err(ClientError::Config(format!(
                "invalid api_version '{}'",
                self.api_version
            )));
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| {
                ClientError::Config(format!("invalid base_url '{}': {}", base_url, e))
            })?;
        }
        self.discovery.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_version, "ver100");
        assert_eq!(config.max_auth_retries, 3);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.accept_invalid_certs);
        assert!(config.base_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ClientConfig::new().with_credentials("admin", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_validation_failures() {
        assert!(ClientConfig::new().with_max_auth_retries(0).validate().is_err());
        assert!(ClientConfig::new().with_base_url("not a url").validate().is_err());
        assert!(ClientConfig::new().with_api_version("ver100/x").validate().is_err());

        let discovery = DiscoveryConfig::default().with_max_attempts(0);
        assert!(matches!(
            ClientConfig::new().with_discovery(discovery).validate(),
            Err(ClientError::Discovery(_))
        ));
    }

    #[test]
    fn test_http_and_auth_config() {
        let config = ClientConfig::new()
            .with_request_timeout_secs(5)
            .with_accept_invalid_certs(false)
            .with_max_auth_retries(10);
        let http = config.http_config();
        assert_eq!(http.request_timeout_secs, 5);
        assert!(!http.accept_invalid_certs);
        assert_eq!(config.auth_config().max_retries, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
username = "admin"
password = "canon"
base_url = "https://192.168.1.2:443/ccapi"
api_version = "ver110"

[discovery]
max_attempts = 5
receive_timeout_ms = 2000
"#
        )
        .unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.username, "admin");
        assert_eq!(config.base_url.as_deref(), Some("https://192.168.1.2:443/ccapi"));
        assert_eq!(config.api_version, "ver110");
        assert_eq!(config.max_auth_retries, 3);
        assert_eq!(config.discovery.max_attempts, 5);
        assert_eq!(config.discovery.receive_timeout_ms, 2000);
        assert_eq!(config.discovery.mx, 1);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_auth_retries = 0").unwrap();
        assert!(matches!(
            ClientConfig::load(Some(file.path())),
            Err(ClientError::Config(_))
        ));
    }
}
