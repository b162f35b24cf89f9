//! Error types for digest authentication operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The `WWW-Authenticate` value is not a Digest challenge or is malformed
    #[error("Unparseable digest challenge: {0}")]
    ChallengeUnparseable(String),

    /// A required directive (`realm` or `nonce`) is absent
    #[error("Digest challenge is missing required field '{0}'")]
    ChallengeMissingField(&'static str),

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No challenge has been absorbed yet
    #[error("Not authenticated: no digest challenge has been received")]
    NotAuthenticated,

    #[error("401 response did not carry a WWW-Authenticate header")]
    MissingChallengeHeader,

    #[error("Maximum authentication retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("Unexpected status code: {0}")]
    UnexpectedStatusCode(u16),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AuthError {
    /// Whether the failure came from the server refusing the credentials
    /// rather than from transport or protocol problems.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AuthError::MaxRetriesExceeded { .. } | AuthError::NotAuthenticated
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::NetworkFailure(err.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(err: url::ParseError) -> Self {
        AuthError::InvalidUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
