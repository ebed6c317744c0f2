//! Generative reply composition.
//!
//! Builds the bounded prompt for open-ended replies and normalizes what
//! comes back from the completion service. The actual service call is
//! made by the orchestrator through the
//! [`CompletionProvider`](crate::ports::CompletionProvider) port.

use crate::domain::document::DocumentContext;
use crate::domain::session::{Role, TurnMessage};

/// Maximum prior turns included in the prompt window.
const HISTORY_WINDOW: usize = 6;

/// Maximum outstanding fields summarized in the prompt.
const MAX_FIELD_SUMMARY: usize = 8;

/// Role prefixes models sometimes leak at the start of a reply.
const ROLE_PREFIXES: [&str; 6] = ["assistant:", "user:", "system:", "bot:", "ai:", "human:"];

/// Builds the prompt for an open-ended reply.
///
/// Contains the assistant persona, a bounded summary of the pending
/// document's outstanding fields, a bounded window of prior turns, and
/// the current user message.
pub fn build_prompt(
    pending_document: Option<&DocumentContext>,
    history: &[TurnMessage],
    user_message: &str,
) -> String {
    let mut prompt = String::from(
        "You are a helpful government services assistant. You help users renew driving licenses and pay TNB bills. Reply briefly and politely in the user's language.\n",
    );

    if let Some(doc) = pending_document {
        prompt.push_str("\nThe user has a document awaiting verification with these fields:\n");
        for (name, value) in doc.extracted_data.iter().take(MAX_FIELD_SUMMARY) {
            prompt.push_str(&format!("- {}: {}\n", name, value));
        }
    }

    let window_start = history.len().saturating_sub(HISTORY_WINDOW);
    if window_start < history.len() {
        prompt.push_str("\nRecent conversation:\n");
        for message in &history[window_start..] {
            let speaker = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, message.content));
        }
    }

    prompt.push_str(&format!("\nUser: {}\nAssistant:", user_message));
    prompt
}

/// Strips leaked role-prefix tokens and surrounding whitespace from a
/// model reply.
pub fn normalize_reply(raw: &str) -> String {
    let mut text = raw.trim();
    loop {
        let lowered = text.to_lowercase();
        match ROLE_PREFIXES
            .iter()
            .find(|prefix| lowered.starts_with(*prefix))
        {
            Some(prefix) => text = text[prefix.len()..].trim_start(),
            None => break,
        }
    }
    text.trim().to_string()
}
