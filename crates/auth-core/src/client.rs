//! Authenticated request orchestration.
//!
//! [`DigestClient`] wraps any [`RequestExecutor`] and drives the Digest
//! handshake around it:
//!
//! ```text
//!   no challenge held ──► unauthenticated probe ──► 401 ──► absorb
//!                                                   │
//!                         ┌─────────────────────────┘
//!                         ▼
//!   ┌──► produce header ──► execute ──► 200/202 ──► Ok(response)
//!   │                          │
//!   │                          ├──► 401 ──► absorb new challenge ──┐
//!   │                          │                                   │
//!   │                          └──► other ──► UnexpectedStatusCode │
//!   └──────────────── (at most max_retries times) ◄────────────────┘
//! ```
//!
//! Exhausting the retry budget resets the session so the next call starts a
//! fresh handshake.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::challenge::select_digest_header;
use crate::error::{AuthError, Result};
use crate::session::AuthSession;

/// Default bound on authenticated attempts per logical request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// One logical request against the camera.
#[derive(Debug, Clone)]
pub struct CameraRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub content_type: Option<String>,
}

impl CameraRequest {
    pub fn new(method: Method, url: Url) -> Self {
        CameraRequest {
            method,
            url,
            body: None,
            content_type: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_body(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type.into());
        self
    }

    /// The digest `uri`: path plus optional query, without scheme or host.
    pub fn digest_uri(&self) -> String {
        let path = match self.url.path() {
            "" => "/",
            path => path,
        };
        match self.url.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        }
    }
}

/// Status, headers and body of one executed request.
#[derive(Debug, Clone, Default)]
pub struct CameraResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CameraResponse {
    pub fn new(status: u16) -> Self {
        CameraResponse {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// All values of a header, matched case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn header<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.header_values(name).next()
    }

    /// The Digest `WWW-Authenticate` value, if the response carries one.
    pub fn www_authenticate(&self) -> Option<&str> {
        select_digest_header(self.header_values("www-authenticate"))
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 202)
    }
}

/// Sends a request, optionally carrying an `Authorization` value.
///
/// Implementations perform plain transport work and must not interpret the
/// status code; transport failures map to [`AuthError::NetworkFailure`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &CameraRequest,
        authorization: Option<&str>,
    ) -> Result<CameraResponse>;
}

#[async_trait]
impl<E: RequestExecutor + ?Sized> RequestExecutor for Arc<E> {
    async fn execute(
        &self,
        request: &CameraRequest,
        authorization: Option<&str>,
    ) -> Result<CameraResponse> {
        (**self).execute(request, authorization).await
    }
}

/// Retry policy for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClientConfig {
    pub max_retries: u32,
}

impl Default for AuthClientConfig {
    fn default() -> Self {
        AuthClientConfig {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl AuthClientConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Executes requests with transparent Digest authentication.
pub struct DigestClient<E> {
    executor: E,
    session: Arc<AuthSession>,
    config: AuthClientConfig,
}

impl<E: RequestExecutor> DigestClient<E> {
    pub fn new(executor: E, session: Arc<AuthSession>, config: AuthClientConfig) -> Result<Self> {
        if config.max_retries == 0 {
            return Err(AuthError::ConfigError(
                "max_retries must be at least 1".to_string(),
            ));
        }
        Ok(DigestClient {
            executor,
            session,
            config,
        })
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &AuthClientConfig {
        &self.config
    }

    /// Executes one logical request, handling 401 challenges.
    ///
    /// Returns the response on 200/202. Any other non-401 status fails
    /// immediately with [`AuthError::UnexpectedStatusCode`].
    pub async fn send(&self, request: &CameraRequest) -> Result<CameraResponse> {
        if !self.session.is_authenticated() {
            debug!("No digest challenge held, probing {}", request.url);
            let response = self.executor.execute(request, None).await?;

            match response.status {
                200 | 202 => {
                    info!("{} {} succeeded without authentication", request.method, request.url);
                    return Ok(response);
                }
                401 => {
                    let header = response
                        .www_authenticate()
                        .ok_or(AuthError::MissingChallengeHeader)?;
                    self.session.absorb_header(header)?;
                }
                code => return Err(AuthError::UnexpectedStatusCode(code)),
            }
        }

        let uri = request.digest_uri();
        let method = request.method.as_str();

        for attempt in 1..=self.config.max_retries {
            let authorization =
                self.session
                    .produce_header(method, &uri, request.body.as_deref())?;
            let response = self
                .executor
                .execute(request, Some(&authorization.to_string()))
                .await?;

            debug!(
                status = response.status,
                attempt,
                max_retries = self.config.max_retries,
                "{} {}",
                method,
                uri
            );

            match response.status {
                200 | 202 => return Ok(response),
                401 => match response.www_authenticate() {
                    Some(header) => {
                        debug!("Received 401, absorbing refreshed challenge");
                        self.session.absorb_header(header)?;
                    }
                    None => warn!("Received 401 without WWW-Authenticate, retrying with held challenge"),
                },
                code => return Err(AuthError::UnexpectedStatusCode(code)),
            }
        }

        warn!(
            "Giving up on {} {} after {} authenticated attempts",
            method, uri, self.config.max_retries
        );
        self.session.reset();
        Err(AuthError::MaxRetriesExceeded {
            attempts: self.config.max_retries,
        })
    }
}
