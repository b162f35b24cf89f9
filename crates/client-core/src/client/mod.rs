//! Camera control client
//!
//! [`CameraClient`] resolves endpoint paths against the camera's control
//! base URL and sends them through a [`DigestClient`], so callers never see
//! the 401 handshake. It holds its own [`AuthSession`] unless one is shared
//! in through [`CameraClient::with_session`].

pub mod config;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use ccapi_auth_core::{
    AuthSession, CameraRequest, CameraResponse, DigestClient, Method, ReqwestExecutor,
    RequestExecutor,
};
use ccapi_discovery_core::{CancellationToken, DeviceDescriptor, DiscoveryEngine};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::error::{ClientError, Result};
use crate::settings::{SettingResponse, SettingValue};
use self::config::ClientConfig;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Authenticated access to one camera's control API.
pub struct CameraClient<E = ReqwestExecutor> {
    base_url: Url,
    api_version: String,
    digest: DigestClient<E>,
}

impl CameraClient<ReqwestExecutor> {
    /// Creates a client for the configured `base_url`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            ClientError::Config(
                "base_url is not set; configure it or discover the camera first".to_string(),
            )
        })?;
        let executor = ReqwestExecutor::new(&config.http_config())?;
        Self::with_executor(base_url, config, executor)
    }

    /// Creates a client for a discovered camera, ignoring any configured
    /// `base_url`.
    pub fn from_device(device: &DeviceDescriptor, config: &ClientConfig) -> Result<Self> {
        info!(
            udn = %device.udn,
            "Connecting to {} at {}",
            device.display_name(),
            device.control_base_url
        );
        let executor = ReqwestExecutor::new(&config.http_config())?;
        Self::with_executor(&device.control_base_url, config, executor)
    }

    /// Runs discovery and connects to the first camera that answered.
    /// `Ok(None)` when nothing was found or discovery was cancelled first.
    pub async fn discover(config: &ClientConfig, cancel: CancellationToken) -> Result<Option<Self>> {
        let (mut engine, _events) = DiscoveryEngine::new(config.discovery.clone())?;
        let report = engine.discover(cancel).await?;

        match report.devices.first() {
            Some(device) => Ok(Some(Self::from_device(device, config)?)),
            None => {
                info!("{}", report.status);
                Ok(None)
            }
        }
    }
}

impl<E: RequestExecutor> CameraClient<E> {
    pub fn with_executor(base_url: &str, config: &ClientConfig, executor: E) -> Result<Self> {
        let session = Arc::new(AuthSession::new(config.credentials()));
        Self::with_session(base_url, config, executor, session)
    }

    /// Creates a client that shares `session` with other clients of the
    /// same camera.
    pub fn with_session(
        base_url: &str,
        config: &ClientConfig,
        executor: E,
        session: Arc<AuthSession>,
    ) -> Result<Self> {
        config.validate()?;
        let base_url = normalize_base_url(base_url)?;
        let digest = DigestClient::new(executor, session, config.auth_config())?;

        Ok(CameraClient {
            base_url,
            api_version: config.api_version.clone(),
            digest,
        })
    }

    /// Base URL with a trailing slash.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        self.digest.session()
    }

    /// Forgets the held challenge; the next request re-handshakes.
    pub fn reset_authentication(&self) {
        self.digest.session().reset();
    }

    pub fn is_authenticated(&self) -> bool {
        self.digest.session().is_authenticated()
    }

    /// Resolves a path relative to the base URL. An empty path is the base
    /// URL itself.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        let relative = path.trim_start_matches('/');
        let invalid = |reason: &str| ClientError::InvalidEndpoint {
            endpoint: path.to_string(),
            reason: reason.to_string(),
        };

        if relative.is_empty() {
            let mut url = self.base_url.clone();
            let trimmed = url.path().trim_end_matches('/').to_string();
            url.set_path(&trimmed);
            return Ok(url);
        }
        if relative.split('/').any(|segment| segment == "..") {
            return Err(invalid("parent segments are not allowed"));
        }

        let url = self
            .base_url
            .join(relative)
            .map_err(|e| invalid(&e.to_string()))?;
        if !url.as_str().starts_with(self.base_url.as_str()) {
            return Err(invalid("resolves outside the control API"));
        }
        Ok(url)
    }

    /// Prefixes an endpoint with the configured API version.
    pub fn versioned_path(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_version, endpoint.trim_start_matches('/'))
    }

    /// Sends one request. `path` is relative to the base URL and includes
    /// the version segment (`ver100/deviceinformation`).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<CameraResponse> {
        let url = self.endpoint_url(path)?;
        let mut request = CameraRequest::new(method, url);
        if let Some(body) = body {
            request = request.with_body(serde_json::to_vec(body)?, JSON_CONTENT_TYPE);
        }

        debug!("{} {}", request.method, request.url);
        Ok(self.digest.send(&request).await?)
    }

    /// Performs the handshake up front by requesting the base URL.
    pub async fn authenticate(&self) -> Result<()> {
        if self.is_authenticated() {
            debug!("Already authenticated");
            return Ok(());
        }
        self.request(Method::GET, "", None).await?;
        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path, None).await?;
        decode(&response.body)
    }

    pub async fn put_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let response = self.request(Method::PUT, path, Some(body)).await?;
        decode(&response.body)
    }

    /// Reads a setting, e.g. [`crate::settings::ISO`].
    pub async fn get_setting(&self, endpoint: &str) -> Result<SettingResponse> {
        self.get_json(&self.versioned_path(endpoint)).await
    }

    /// Changes a setting by sending `{"value": value}`.
    pub async fn put_setting(&self, endpoint: &str, value: &str) -> Result<SettingResponse> {
        let body = serde_json::to_value(SettingValue::new(value))?;
        self.put_json(&self.versioned_path(endpoint), &body).await
    }
}

fn normalize_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::Config(format!(
            "base URL '{}' cannot carry endpoint paths",
            base_url
        )));
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// An empty body (202 Accepted) decodes as `{}`.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Object(Map::new()))?);
    }
    Ok(serde_json::from_slice(body)?)
}
