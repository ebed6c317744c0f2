//! Mock completion provider for tests.
//!
//! Pre-configured replies are consumed in order; an exhausted queue
//! falls back to a fixed default. Errors can be injected to exercise
//! the degradation paths, and every request is recorded for
//! verification.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::{CompletionError, CompletionProvider, CompletionRequest};

/// One scripted mock result.
enum MockReply {
    Success(String),
    Failure(String),
}

/// Scriptable in-process completion provider.
#[derive(Default)]
pub struct MockCompletionProvider {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Success(reply.into()));
        self
    }

    /// Queues a transport failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Failure(message.into()));
        self
    }

    /// Requests seen so far.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Success(reply)) => Ok(reply),
            Some(MockReply::Failure(message)) => Err(CompletionError::Transport(message)),
            None => Ok("Understood.".to_string()),
        }
    }
}
