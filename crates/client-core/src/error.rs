use ccapi_auth_core::AuthError;
use ccapi_discovery_core::DiscoveryError;
use thiserror::Error;

/// Errors surfaced by [`crate::CameraClient`] and its configuration
#[derive(Error, Debug)]
pub enum ClientError {
    /// Digest handshake or transport failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The camera answered with a body that is not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether the camera rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Auth(e) if e.is_auth_failure())
    }
}

impl From<ccapi_infra_common::Error> for ClientError {
    fn from(err: ccapi_infra_common::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
