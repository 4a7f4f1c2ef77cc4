use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::app_config::ApiConfig;
use crate::errors::TransportError;

use super::{StepRequest, StepResponse, StepTransport};

/// Transport posting each step to the remote translation endpoint
#[derive(Debug, Clone)]
pub struct HttpStepTransport {
    /// HTTP client for API requests
    client: Client,
    /// Fully resolved step endpoint
    endpoint: Url,
    /// Name of the anti-forgery header
    token_header: String,
    /// Anti-forgery token, sent only when non-empty
    token: String,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpStepTransport {
    /// Create a transport for an already resolved endpoint
    pub fn new(
        endpoint: Url,
        token_header: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint,
            token_header: token_header.into(),
            token: token.into(),
        }
    }

    /// Create a transport from the `api` section of the configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let endpoint = Self::resolve_endpoint(&config.base_url, &config.step_path)?;
        Ok(Self::new(
            endpoint,
            config.token_header.clone(),
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Join the base URL and the step path without dropping the base's last segment
    pub fn resolve_endpoint(base_url: &str, step_path: &str) -> Result<Url> {
        if step_path.trim().is_empty() {
            return Err(anyhow!("Step path must not be empty"));
        }
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            step_path.trim_start_matches('/')
        );
        Url::parse(&joined).with_context(|| format!("Invalid step endpoint URL: {}", joined))
    }

    /// The endpoint every step is posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl StepTransport for HttpStepTransport {
    async fn send_step(&self, request: &StepRequest) -> Result<StepResponse, TransportError> {
        let mut builder = self.client.post(self.endpoint.clone()).json(request);
        if !self.token.is_empty() {
            builder = builder.header(self.token_header.as_str(), self.token.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            error!(
                "Step endpoint error ({}) for step {}: {}",
                status,
                request.step,
                message.as_deref().unwrap_or(&body)
            );
            return Err(TransportError::Http {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Step {} answered with {} bytes", request.step, body.len());

        serde_json::from_str::<StepResponse>(&body)
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
