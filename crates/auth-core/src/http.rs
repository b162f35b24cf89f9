//! reqwest-backed [`RequestExecutor`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::client::{CameraRequest, CameraResponse, RequestExecutor};
use crate::error::{AuthError, Result};

/// Transport settings for [`ReqwestExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    /// Cameras serve HTTPS with self-signed certificates.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            request_timeout_secs: 30,
            accept_invalid_certs: true,
            user_agent: format!("ccapi-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AuthError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(ReqwestExecutor { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestExecutor { client }
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(
        &self,
        request: &CameraRequest,
        authorization: Option<&str>,
    ) -> Result<CameraResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        trace!(status, bytes = body.len(), "{} {}", request.method, request.url);

        Ok(CameraResponse {
            status,
            headers,
            body,
        })
    }
}
