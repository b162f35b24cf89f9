//! Error types for camera discovery

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The device description is not well-formed XML
    #[error("Invalid device description: {0}")]
    InvalidDeviceDescription(String),

    /// The description carries no (or an empty) `X_accessURL` element
    #[error("Device description has no control URL")]
    MissingControlUrl,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The SSDP `LOCATION` value is not a usable URL
    #[error("Invalid location URL '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("Invalid discovery configuration: {0}")]
    Config(String),

    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        DiscoveryError::NetworkFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
