//! Document extraction port - interface to the OCR/extraction service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::document::CategoryDetection;

/// An uploaded attachment reference from the turn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// Structured output of the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Field name -> extracted string value.
    pub fields: BTreeMap<String, String>,

    /// Category label with confidence.
    pub category: CategoryDetection,

    /// Quality assessment: true when the image is too blurry to trust.
    pub blurry: bool,
}

/// Extraction service errors.
///
/// Unlike completions, extraction failure aborts the upload turn with a
/// service-error response; there is no useful degradation.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction transport error: {0}")]
    Transport(String),

    #[error("extraction service rejected the document: {0}")]
    Rejected(String),

    #[error("extraction parse error: {0}")]
    Parse(String),

    #[error("extraction timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Port for the document extraction service.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extracts structured fields from an uploaded image.
    async fn extract(&self, attachment: &Attachment) -> Result<ExtractionResult, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_extractor_is_object_safe() {
        fn _accepts_dyn(_extractor: &dyn DocumentExtractor) {}
    }

    #[test]
    fn attachment_type_field_uses_wire_name() {
        let att = Attachment {
            url: "https://files.example/ic.jpg".to_string(),
            name: "ic.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
        };
        let json = serde_json::to_value(&att).unwrap();
        assert_eq!(json["type"], "image/jpeg");
    }
}
