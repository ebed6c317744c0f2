//! Document context entry - one per uploaded artifact.
//!
//! An entry is created after a successful, non-blurry extraction and then
//! driven through the verification state machine:
//! `unverified -> correcting -> verified` (terminal). Corrections are
//! staged in `corrected_data` and only merged into `extracted_data` at
//! the `verified` transition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};

use super::category::DocumentCategory;

/// Tri-state verification status of an uploaded document.
///
/// Legacy sessions persisted this as a boolean; the schema upgrade step
/// rewrites those to the string form before deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    #[default]
    Unverified,
    Correcting,
    Verified,
}

impl VerificationState {
    /// Returns true if the document still needs user confirmation.
    pub fn is_pending(&self) -> bool {
        !matches!(self, VerificationState::Verified)
    }
}

/// Category label and confidence reported by the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDetection {
    pub detected_category: String,
    pub confidence: f64,
}

/// Per-document slice of the session context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Original attachment file name.
    pub file_name: String,

    /// Field name -> extracted string value.
    pub extracted_data: BTreeMap<String, String>,

    /// Category label assigned by the extraction service.
    pub category_detection: CategoryDetection,

    /// Verification state machine position.
    pub is_verified: VerificationState,

    /// Pending user-supplied replacements, staged until confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_data: Option<BTreeMap<String, String>>,

    /// When the attachment was processed (orders pending resolution).
    pub uploaded_at: Timestamp,
}

impl DocumentContext {
    /// Creates a fresh, unverified entry from extraction output.
    pub fn new(
        file_name: impl Into<String>,
        extracted_data: BTreeMap<String, String>,
        category_detection: CategoryDetection,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            extracted_data,
            category_detection,
            is_verified: VerificationState::Unverified,
            corrected_data: None,
            uploaded_at: Timestamp::now(),
        }
    }

    /// Parsed category of this document.
    pub fn category(&self) -> DocumentCategory {
        DocumentCategory::parse(&self.category_detection.detected_category)
    }

    /// Marks the document as needing correction (user rejected the
    /// extracted data without supplying replacements yet).
    pub fn mark_rejected(&mut self) -> Result<(), DomainError> {
        if self.is_verified == VerificationState::Verified {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Document is already verified",
            ));
        }
        self.is_verified = VerificationState::Correcting;
        Ok(())
    }

    /// Stages corrections on top of any already-staged ones.
    ///
    /// `correcting` may loop while the user iterates; later corrections
    /// for the same field overwrite earlier staged values.
    pub fn stage_corrections(
        &mut self,
        corrections: BTreeMap<String, String>,
    ) -> Result<(), DomainError> {
        if self.is_verified == VerificationState::Verified {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Document is already verified",
            ));
        }
        if corrections.is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "No corrections resolved",
            ));
        }
        self.corrected_data
            .get_or_insert_with(BTreeMap::new)
            .extend(corrections);
        self.is_verified = VerificationState::Correcting;
        Ok(())
    }

    /// Confirms the document: merges staged corrections into
    /// `extracted_data`, clears them, and moves to `verified`.
    ///
    /// The caller must persist the whole entry as one atomic context-key
    /// replacement so no turn observes a partial merge.
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        if self.is_verified == VerificationState::Verified {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Document is already verified",
            ));
        }
        if let Some(corrections) = self.corrected_data.take() {
            self.extracted_data.extend(corrections);
        }
        self.is_verified = VerificationState::Verified;
        Ok(())
    }

    /// Extracted identifier for identity cross-checks, if present.
    pub fn identifier_value(&self) -> Option<&str> {
        const IDENTIFIER_FIELDS: [&str; 3] = ["ic_number", "nric", "identity_card_number"];
        IDENTIFIER_FIELDS
            .iter()
            .find_map(|f| self.extracted_data.get(*f))
            .map(String::as_str)
    }
}

/// Normalizes an identifier for comparison: alphanumerics, uppercased.
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Masks an identifier, keeping only the last four characters visible.
pub fn mask_identifier(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
