//! Extraction service configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Document extraction service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionServiceConfig {
    /// Extraction endpoint URL.
    pub endpoint: String,

    /// Optional API key for the service.
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ExtractionServiceConfig {
    /// Timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates extraction configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::MissingRequired("EXTRACTION_ENDPOINT"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidEndpoint("extraction"));
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    60
}
