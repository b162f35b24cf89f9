use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};
use crate::ssdp::{CCAPI_SERVICE_TYPE, SSDP_MULTICAST_ADDR};

/// Discovery settings.
///
/// Durations are stored as integers so the struct maps directly onto a
/// config file section:
///
/// ```toml
/// [discovery]
/// max_attempts = 3
/// receive_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// `ST` value sent in each probe
    pub service_type: String,
    /// Where probes are sent, normally the SSDP multicast group
    pub target: SocketAddr,
    /// Local address of the probe socket
    pub bind_addr: SocketAddr,
    pub max_attempts: u32,
    /// Listening window after each probe
    pub receive_timeout_ms: u64,
    /// Pause between the end of one window and the next probe
    pub attempt_interval_ms: u64,
    pub mx: u8,
    pub multicast_ttl: Option<u32>,
    /// Timeout for fetching one device description
    pub fetch_timeout_secs: u64,
    pub event_channel_capacity: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            service_type: CCAPI_SERVICE_TYPE.to_string(),
            target: SSDP_MULTICAST_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([239, 255, 255, 250], 1900))),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            max_attempts: 3,
            receive_timeout_ms: 5000,
            attempt_interval_ms: 1000,
            mx: 1,
            multicast_ttl: None,
            fetch_timeout_secs: 5,
            event_channel_capacity: 100,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_attempt_interval(mut self, interval: Duration) -> Self {
        self.attempt_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn attempt_interval(&self) -> Duration {
        Duration::from_millis(self.attempt_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(DiscoveryError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.service_type.trim().is_empty() {
            return Err(DiscoveryError::Config(
                "service_type must not be empty".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(DiscoveryError::Config(
                "event_channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.target.to_string(), SSDP_MULTICAST_ADDR);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.receive_timeout(), Duration::from_secs(5));
        assert_eq!(config.attempt_interval(), Duration::from_secs(1));
        assert_eq!(config.mx, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = DiscoveryConfig::default().with_max_attempts(0);
        assert!(matches!(config.validate(), Err(DiscoveryError::Config(_))));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: DiscoveryConfig =
            serde_json::from_str(r#"{"max_attempts": 5, "target": "127.0.0.1:1900"}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.target, SocketAddr::from(([127, 0, 0, 1], 1900)));
        assert_eq!(config.service_type, CCAPI_SERVICE_TYPE);
    }
}
