//! Intent module - structured meaning of user messages.
//!
//! The deterministic, multilingual keyword matchers live here; the
//! priority-ordered rule table that combines them with session state
//! (and the completion-service fallback) is the application-layer
//! [`IntentClassifier`](crate::application::IntentClassifier).

mod intent;
mod keywords;

pub use intent::{Intent, TimeoutChoice};
pub use keywords::{
    detect_service, is_affirmative, is_negative, is_rejection, is_termination,
    is_transcription_failure, normalize, select_option, timeout_choice,
};
