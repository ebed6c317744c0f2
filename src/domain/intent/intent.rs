//! The closed set of structured intents a turn can resolve to.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::workflow::ServiceKind;

/// The user's choice when asked whether to continue after a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutChoice {
    /// Resume the session and re-serve the last assistant message.
    Continue,
    /// Archive the session and start clean.
    New,
    /// Neither recognized; re-ask and keep the flag.
    Unclear,
}

/// Classified structured meaning of one user message.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Affirmative,
    Negative,
    /// Pending document's extracted data was rejected outright.
    DocumentRejected,
    /// Free-text correction resolved at least one field.
    CorrectionProvided(BTreeMap<String, String>),
    /// Explicit request to end the conversation.
    EndSession,
    /// Fresh service request detected from free text.
    ServiceSelection(ServiceKind),
    /// Renewal duration in years.
    DurationSelection(u8),
    /// One of the presented account options.
    AccountSelection(String),
    /// Reply to the inactivity-timeout question.
    TimeoutChoice(TimeoutChoice),
    /// Upstream speech-to-text failure marker.
    TranscriptionFailure,
    /// No structured intent; pass the raw message to composition.
    None,
}

impl Intent {
    /// Stable tag recorded on the user message and in the response.
    pub fn tag(&self) -> &'static str {
        match self {
            Intent::Affirmative => "affirmative",
            Intent::Negative => "negative",
            Intent::DocumentRejected => "document_rejection",
            Intent::CorrectionProvided(_) => "correction_provided",
            Intent::EndSession => "session_termination",
            Intent::ServiceSelection(_) => "service_selection",
            Intent::DurationSelection(_) => "duration_selection",
            Intent::AccountSelection(_) => "account_selection",
            Intent::TimeoutChoice(_) => "timeout_choice",
            Intent::TranscriptionFailure => "transcription_failure",
            Intent::None => "none",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
