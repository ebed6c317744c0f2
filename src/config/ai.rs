//! Completion service configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Completion gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// Completion endpoint URL.
    pub endpoint: String,

    /// Optional API key for the gateway.
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl CompletionConfig {
    /// Timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates completion configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::MissingRequired("COMPLETION_ENDPOINT"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidEndpoint("completion"));
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_endpoint_passes() {
        let config = CompletionConfig {
            endpoint: "https://gateway.example/complete".to_string(),
            api_key: None,
            timeout_secs: default_timeout(),
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn bare_host_is_rejected() {
        let config = CompletionConfig {
            endpoint: "gateway.example".to_string(),
            api_key: None,
            timeout_secs: default_timeout(),
        };
        assert!(config.validate().is_err());
    }
}
