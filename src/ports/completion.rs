//! Completion provider port - interface to the text generation service.
//!
//! The engine uses completions two ways: open-ended reply generation and
//! as a fallback classifier for ambiguous short texts. Both paths must
//! treat the provider as best-effort; a failure degrades gracefully and
//! never fails the turn.

use async_trait::async_trait;
use thiserror::Error;

/// A single prompt with its generation parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl CompletionRequest {
    /// Creates a request with the service defaults (512 / 0.5 / 0.8).
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 512,
            temperature: 0.5,
            top_p: 0.8,
        }
    }

    /// Tight parameters for single-label classification calls.
    pub fn for_classification(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 8,
            temperature: 0.0,
            top_p: 1.0,
        }
    }
}

/// Completion service errors.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Network failure or non-success response.
    #[error("completion transport error: {0}")]
    Transport(String),

    /// Provider quota or rate limit hit.
    #[error("completion quota exceeded: {0}")]
    Quota(String),

    /// The response body could not be interpreted.
    #[error("completion parse error: {0}")]
    Parse(String),

    /// The request did not complete within the bounded timeout.
    #[error("completion timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Port for the completion service.
///
/// Calls are synchronous from the turn's point of view, bounded by a
/// configured timeout, and never retried automatically.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates text for a prompt.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}
