//! Completion gateway provider.
//!
//! Talks to the model-serving gateway over HTTP JSON: the request
//! carries the prompt and generation parameters, the response carries a
//! single generated string. Every call is bounded by the configured
//! timeout so a slow model can never hang a turn.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{CompletionError, CompletionProvider, CompletionRequest};

/// Configuration for the completion gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Completion endpoint URL.
    pub endpoint: String,
    /// API key sent as a bearer token, if the gateway requires one.
    api_key: Option<Secret<String>>,
    /// Request timeout.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GatewayResponse {
    response: String,
}

/// HTTP implementation of [`CompletionProvider`].
pub struct GatewayProvider {
    config: GatewayConfig,
    client: Client,
}

impl GatewayProvider {
    pub fn new(config: GatewayConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl CompletionProvider for GatewayProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = GatewayRequest {
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        };

        let mut http_request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.bearer_auth(api_key.expose_secret());
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }
            } else {
                CompletionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Quota(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Transport(format!(
                "gateway returned {}: {}",
                status, body
            )));
        }

        let parsed: GatewayResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))?;
        Ok(parsed.response)
    }
}
