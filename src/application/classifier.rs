//! Intent classification - the priority-ordered rule table.
//!
//! Classification is an explicit ordered list of predicate -> handler
//! rules, evaluated per turn and short-circuiting at the first match.
//! The ordering is a versioned contract (see [`RULE_ORDER`]): safety and
//! UX overrides (termination, broken transcription, pending timeout
//! choice) always win over domain state, document state wins over
//! service state, and fresh service detection runs last.
//!
//! Keyword matching is deterministic and multilingual; the completion
//! service is only consulted as a best-effort fallback for ambiguous
//! short texts and service paraphrases, and any failure there degrades
//! to the keyword result.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::document::{contains_field_token, parse_corrections, DocumentContext};
use crate::domain::intent::{
    detect_service, is_affirmative, is_negative, is_rejection, is_termination,
    is_transcription_failure, normalize, select_option, timeout_choice, Intent,
};
use crate::domain::workflow::{parse_duration_years, LicenseState, ServiceKind};
use crate::ports::{CompletionProvider, CompletionRequest};

/// Fixed rule evaluation order. Do not reorder without versioning the
/// contract: every entry must never fire if an earlier one matches.
pub const RULE_ORDER: [&str; 6] = [
    "session_termination",
    "transcription_failure",
    "timeout_choice",
    "document_state",
    "service_state",
    "fresh_service_intent",
];

/// Everything the classifier needs from the session snapshot.
#[derive(Debug, Default)]
pub struct ClassifySnapshot<'a> {
    /// Oldest document still awaiting verification.
    pub pending_document: Option<&'a DocumentContext>,
    /// Currently active service, if any.
    pub active_service: Option<ServiceKind>,
    /// Persisted workflow state string for the active service.
    pub workflow_state: Option<&'a str>,
    /// True if the engine is waiting for a timeout choice.
    pub timeout_awaiting_choice: bool,
    /// Selectable account options presented in the previous turn.
    pub account_options: Vec<String>,
}

/// Priority-ordered intent classifier.
pub struct IntentClassifier {
    completion: Arc<dyn CompletionProvider>,
}

impl IntentClassifier {
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// Classifies one message, short-circuiting at the first matching
    /// rule.
    pub async fn classify(&self, text: &str, snapshot: &ClassifySnapshot<'_>) -> Intent {
        for rule in RULE_ORDER {
            if let Some(intent) = self.apply_rule(rule, text, snapshot).await {
                debug!(rule, intent = intent.tag(), "intent classified");
                return intent;
            }
        }
        Intent::None
    }

    async fn apply_rule(
        &self,
        rule: &str,
        text: &str,
        snapshot: &ClassifySnapshot<'_>,
    ) -> Option<Intent> {
        match rule {
            "session_termination" => self.rule_session_termination(text).await,
            "transcription_failure" => Self::rule_transcription_failure(text),
            "timeout_choice" => Self::rule_timeout_choice(text, snapshot),
            "document_state" => Self::rule_document_state(text, snapshot),
            "service_state" => Self::rule_service_state(text, snapshot),
            "fresh_service_intent" => self.rule_fresh_service_intent(text, snapshot).await,
            _ => None,
        }
    }

    /// Rule 1: explicit session termination overrides everything.
    async fn rule_session_termination(&self, text: &str) -> Option<Intent> {
        if is_termination(text) {
            return Some(Intent::EndSession);
        }
        // Ambiguous short texts that match nothing deterministic get one
        // best-effort fallback call.
        if Self::is_ambiguous_short_text(text) {
            if let Some(label) = self.fallback_label(text, &["quit", "continue"]).await {
                if label == "quit" {
                    return Some(Intent::EndSession);
                }
            }
        }
        None
    }

    /// Rule 2: known upstream transcription-failure markers.
    fn rule_transcription_failure(text: &str) -> Option<Intent> {
        is_transcription_failure(text).then_some(Intent::TranscriptionFailure)
    }

    /// Rule 3: only when a timeout choice is pending.
    fn rule_timeout_choice(text: &str, snapshot: &ClassifySnapshot<'_>) -> Option<Intent> {
        snapshot
            .timeout_awaiting_choice
            .then(|| Intent::TimeoutChoice(timeout_choice(text)))
    }

    /// Rule 4: document-state-dependent checks while a document is
    /// pending verification.
    fn rule_document_state(text: &str, snapshot: &ClassifySnapshot<'_>) -> Option<Intent> {
        let doc = snapshot.pending_document?;

        if is_rejection(text) {
            return Some(Intent::DocumentRejected);
        }

        let corrections = parse_corrections(text, &doc.extracted_data);
        if !corrections.is_empty() {
            return Some(Intent::CorrectionProvided(corrections));
        }

        if is_affirmative(text) && !contains_field_token(text, &doc.extracted_data) {
            return Some(Intent::Affirmative);
        }

        if is_negative(text) {
            // Unclear what is wrong; treat as a rejection and ask.
            return Some(Intent::DocumentRejected);
        }

        None
    }

    /// Rule 5: service-state-dependent checks for the active workflow.
    fn rule_service_state(text: &str, snapshot: &ClassifySnapshot<'_>) -> Option<Intent> {
        snapshot.active_service?;
        let state = snapshot.workflow_state?;

        if !snapshot.account_options.is_empty() {
            if let Some(account) = select_option(text, &snapshot.account_options) {
                return Some(Intent::AccountSelection(account));
            }
        }

        if state == LicenseState::AskingDuration.as_str() {
            if let Ok(years) = parse_duration_years(text) {
                return Some(Intent::DurationSelection(years));
            }
        }

        if is_affirmative(text) {
            return Some(Intent::Affirmative);
        }
        if is_negative(text) {
            return Some(Intent::Negative);
        }

        None
    }

    /// Rule 6: fresh service detection when no service is active.
    async fn rule_fresh_service_intent(
        &self,
        text: &str,
        snapshot: &ClassifySnapshot<'_>,
    ) -> Option<Intent> {
        if snapshot.active_service.is_some() {
            return None;
        }

        if let Some(service) = detect_service(text) {
            return Some(Intent::ServiceSelection(service));
        }

        // Paraphrase fallback ("my road tax thing is expiring").
        let label = self
            .fallback_label(text, &["license_renewal", "bill_payment", "none"])
            .await?;
        ServiceKind::parse(&label).map(Intent::ServiceSelection)
    }

    /// Short text that matched no deterministic list at all.
    fn is_ambiguous_short_text(text: &str) -> bool {
        let normalized = normalize(text);
        let word_count = normalized.split_whitespace().count();
        (1..=4).contains(&word_count)
            && !is_affirmative(text)
            && !is_negative(text)
            && !is_rejection(text)
            && !is_transcription_failure(text)
            && detect_service(text).is_none()
            && parse_duration_years(text).is_err()
    }

    /// One strict "return exactly one label" completion call.
    ///
    /// Best-effort: any transport failure or unexpected output degrades
    /// to `None` so classification falls back to the keyword result.
    async fn fallback_label(&self, text: &str, labels: &[&str]) -> Option<String> {
        let prompt = format!(
            "Classify the user message into exactly one of these labels: {}.\nReply with the label only, nothing else.\n\nUser message: \"{}\"\nLabel:",
            labels.join(", "),
            text
        );

        match self
            .completion
            .complete(CompletionRequest::for_classification(prompt))
            .await
        {
            Ok(raw) => {
                let answer = raw.trim().to_lowercase();
                labels
                    .iter()
                    .find(|label| answer == **label)
                    .map(|label| label.to_string())
            }
            Err(err) => {
                warn!(error = %err, "classification fallback unavailable, using keyword result");
                None
            }
        }
    }
}
