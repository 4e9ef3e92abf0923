//! HTTP transport backed by reqwest.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use super::{CallConfig, Response, Transport};
use crate::cancellation::CancellationToken;
use crate::errors::{ReqflowError, TransportError};

/// A [`Transport`] performing real HTTP calls with `reqwest`.
///
/// The call is raced against its cancellation token; cancelling drops the
/// in-flight reqwest future.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh client.
    pub fn new(user_agent: &str) -> Result<Self, ReqflowError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ReqflowError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(&self, config: &CallConfig) -> Result<Response, TransportError> {
        let method = reqwest::Method::from_bytes(config.method.as_str().as_bytes())
            .map_err(|e| TransportError::invalid_request(e.to_string()))?;

        let mut builder = self.client.request(method, config.url.as_str());
        if !config.params.is_empty() {
            builder = builder.query(&config.params);
        }
        for (name, value) in &config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = config.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, config.timeout))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&e, config.timeout))?;

        Ok(Response {
            status,
            headers,
            text,
            url,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn issue(
        &self,
        config: &CallConfig,
        token: CancellationToken,
    ) -> Result<Response, TransportError> {
        debug!(method = %config.method, url = %config.url, "Issuing HTTP call");

        tokio::select! {
            biased;
            () = token.cancelled() => {
                Err(TransportError::cancelled(token.reason().unwrap_or_default()))
            }
            result = self.send(config) => result,
        }
    }
}

fn map_reqwest_error(error: &reqwest::Error, timeout: Option<Duration>) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout.unwrap_or_default())
    } else if error.is_builder() {
        TransportError::invalid_request(error.to_string())
    } else {
        TransportError::network(error.to_string())
    }
}
