//! Mock document extractor for tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use crate::domain::document::CategoryDetection;
use crate::ports::{Attachment, DocumentExtractor, ExtractionError, ExtractionResult};

/// Scriptable in-process extractor.
///
/// Results are keyed by attachment name, with an optional fallback
/// queue consumed in order for unkeyed calls.
#[derive(Default)]
pub struct MockDocumentExtractor {
    by_name: Mutex<HashMap<String, ExtractionResult>>,
    queue: Mutex<VecDeque<Result<ExtractionResult, ExtractionError>>>,
}

impl MockDocumentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the result for a specific attachment name.
    pub fn with_document(
        self,
        name: impl Into<String>,
        category: impl Into<String>,
        fields: &[(&str, &str)],
    ) -> Self {
        let result = ExtractionResult {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            category: CategoryDetection {
                detected_category: category.into(),
                confidence: 0.95,
            },
            blurry: false,
        };
        self.by_name.lock().unwrap().insert(name.into(), result);
        self
    }

    /// Scripts a blurry verdict for a specific attachment name.
    pub fn with_blurry(self, name: impl Into<String>) -> Self {
        let result = ExtractionResult {
            fields: BTreeMap::new(),
            category: CategoryDetection {
                detected_category: "other".to_string(),
                confidence: 0.0,
            },
            blurry: true,
        };
        self.by_name.lock().unwrap().insert(name.into(), result);
        self
    }

    /// Queues a failure for the next unkeyed call.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.queue
            .lock()
            .unwrap()
            .push_back(Err(ExtractionError::Transport(message.into())));
        self
    }
}

#[async_trait]
impl DocumentExtractor for MockDocumentExtractor {
    async fn extract(&self, attachment: &Attachment) -> Result<ExtractionResult, ExtractionError> {
        if let Some(result) = self.by_name.lock().unwrap().get(&attachment.name) {
            return Ok(result.clone());
        }
        match self.queue.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Err(ExtractionError::Rejected(format!(
                "no scripted result for {}",
                attachment.name
            ))),
        }
    }
}
