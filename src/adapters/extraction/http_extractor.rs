//! HTTP client for the document extraction service.
//!
//! The service receives the attachment reference and returns extracted
//! fields plus a category detection and a quality verdict. Calls are
//! bounded by the configured timeout.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::document::CategoryDetection;
use crate::ports::{Attachment, DocumentExtractor, ExtractionError, ExtractionResult};

/// Configuration for the extraction service client.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Extraction endpoint URL.
    pub endpoint: String,
    /// API key sent as a bearer token, if required.
    api_key: Option<Secret<String>>,
    /// Request timeout.
    pub timeout: Duration,
}

impl ExtractionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(60),
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
struct ExtractRequest<'a> {
    url: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    content_type: &'a str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    fields: BTreeMap<String, String>,
    category: CategoryDetection,
    #[serde(default)]
    blurry: bool,
}

/// HTTP implementation of [`DocumentExtractor`].
pub struct HttpDocumentExtractor {
    config: ExtractionConfig,
    client: Client,
}

impl HttpDocumentExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractionError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl DocumentExtractor for HttpDocumentExtractor {
    async fn extract(&self, attachment: &Attachment) -> Result<ExtractionResult, ExtractionError> {
        let body = ExtractRequest {
            url: &attachment.url,
            name: &attachment.name,
            content_type: &attachment.content_type,
        };

        let mut http_request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.bearer_auth(api_key.expose_secret());
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }
            } else {
                ExtractionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Rejected(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Transport(format!(
                "extraction service returned {}: {}",
                status, body
            )));
        }

        let parsed: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;
        Ok(ExtractionResult {
            fields: parsed.fields,
            category: parsed.category,
            blurry: parsed.blurry,
        })
    }
}
