//! Deterministic reply templates.
//!
//! Safety-critical and highly structured replies never go through the
//! completion service: terminations, payment confirmations, invalid
//! input notices, and state-machine prompts are all fixed strings built
//! here.

use std::collections::BTreeMap;

use crate::domain::document::DocumentContext;
use crate::domain::workflow::{ServiceKind, MAX_YEARS, MIN_YEARS};

fn field_lines(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("- {}: {}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Asks the user to confirm freshly extracted document data.
pub fn verification_prompt(doc: &DocumentContext) -> String {
    format!(
        "I've read your document \"{}\". Please check the details:\n{}\n\nIs everything correct? Reply \"yes\" to confirm, or tell me what to fix.",
        doc.file_name,
        field_lines(&doc.extracted_data)
    )
}

/// Acknowledges staged corrections and asks for confirmation.
pub fn correction_ack(doc: &DocumentContext) -> String {
    let staged = doc
        .corrected_data
        .as_ref()
        .map(field_lines)
        .unwrap_or_default();
    format!(
        "Noted. I'll apply these changes:\n{}\n\nAnything else to fix, or shall I confirm the document?",
        staged
    )
}

/// The user rejected the extraction without saying what is wrong.
pub fn correction_needed_prompt() -> String {
    "Sorry about that. Which field is wrong, and what should it be? For example: \"name: Ahmad Bin Ali\".".to_string()
}

/// Confirms a verified document.
pub fn document_verified_notice() -> String {
    "Thank you, the document details are confirmed.".to_string()
}

/// Identity document does not belong to the authenticated subject.
pub fn identity_mismatch_notice(masked_id: &str) -> String {
    format!(
        "The identity number on this document ({}) doesn't match your account. Please upload your own document.",
        masked_id
    )
}

/// Upload was too blurry to extract.
pub fn blurry_document_notice() -> String {
    "The image is too blurry to read. Please upload a clearer photo.".to_string()
}

/// Wrong document category while a service is active.
pub fn wrong_category_notice(service: ServiceKind) -> String {
    let needed = match service {
        ServiceKind::LicenseRenewal => "your identity card or driving license",
        ServiceKind::BillPayment => "your TNB bill",
    };
    format!(
        "That document doesn't look right for {}. Please upload {} instead.",
        service.display_name(),
        needed
    )
}

/// Ambiguous identity-only upload: ask which service to start.
pub fn service_choice_prompt() -> String {
    "Your identity card is confirmed. What would you like to do today - renew your driving license, or pay a TNB bill?".to_string()
}

/// License renewal offer once readiness is reached.
pub fn license_offer(doc: &DocumentContext) -> String {
    format!(
        "Here are your license details:\n{}\n\nWould you like to renew this license?",
        field_lines(&doc.extracted_data)
    )
}

/// Asks how many years to renew for.
pub fn ask_duration() -> String {
    format!(
        "How many years would you like to renew for? (between {} and {})",
        MIN_YEARS, MAX_YEARS
    )
}

/// Duration input could not be parsed or was out of range.
pub fn invalid_duration_notice() -> String {
    format!(
        "Sorry, I need a number of years between {} and {}. For example: \"3\" or \"three years\".",
        MIN_YEARS, MAX_YEARS
    )
}

/// Shows the computed renewal fee for confirmation.
pub fn payment_details(years: u8, fee: f64) -> String {
    format!(
        "Renewal for {} year(s) comes to RM{:.2}. Shall I proceed with the payment?",
        years, fee
    )
}

/// Payment confirmed; terminal for the license workflow.
pub fn payment_confirmed(years: u8, fee: f64) -> String {
    format!(
        "Payment of RM{:.2} confirmed. Your license is renewed for {} year(s). Is there anything else, or shall we end here?",
        fee, years
    )
}

/// Multiple linked accounts: ask which one.
pub fn account_choice_prompt(options: &[String]) -> String {
    let listed = options
        .iter()
        .enumerate()
        .map(|(i, acc)| format!("{}. {}", i + 1, acc))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You have several TNB accounts on file. Which one would you like to pay?\n{}",
        listed
    )
}

/// Shows the outstanding bill for confirmation.
pub fn bills_summary(account: &str, amount: &str) -> String {
    format!(
        "Your TNB account {} has an outstanding amount of RM{}. Would you like to pay it now?",
        account, amount
    )
}

/// Bill payment confirmed; terminal for the bill workflow.
pub fn bill_payment_confirmed(account: &str, amount: &str) -> String {
    format!(
        "Payment of RM{} for account {} is confirmed. Is there anything else, or shall we end here?",
        amount, account
    )
}

/// No outstanding bills: nothing to pay.
pub fn no_outstanding_bills() -> String {
    "Good news - there are no outstanding bills on your account. Is there anything else, or shall we end here?".to_string()
}

/// Asks for the documents a service still needs.
pub fn documents_needed_prompt(service: ServiceKind) -> String {
    let needed = match service {
        ServiceKind::LicenseRenewal => "a photo of your identity card or driving license",
        ServiceKind::BillPayment => "a photo of your TNB bill",
    };
    format!(
        "To continue with {}, please upload {}.",
        service.display_name(),
        needed
    )
}

/// Termination confirmation (session cancelled).
pub fn session_cancelled_notice() -> String {
    "Alright, I've cancelled this session. Thank you, and see you again.".to_string()
}

/// Graceful end-of-session confirmation.
pub fn session_completed_notice() -> String {
    "Thank you for using the assistant. Goodbye!".to_string()
}

/// Inactivity timeout: ask whether to continue or start fresh.
pub fn timeout_choice_prompt() -> String {
    "You've been away for a while. Would you like to continue where we left off, or start a new session?".to_string()
}

/// Timeout choice was unclear; re-ask.
pub fn timeout_choice_reprompt() -> String {
    "Please reply \"continue\" to pick up where we left off, or \"new\" to start over.".to_string()
}

/// Re-serves the last assistant message after a resume.
pub fn resume_banner(last_message: &str) -> String {
    format!("Welcome back. Here's where we were:\n\n{}", last_message)
}

/// Re-serves the last assistant message after a transcription failure.
pub fn transcription_failure_banner(last_message: Option<&str>) -> String {
    match last_message {
        Some(last) => format!(
            "I couldn't hear that clearly. Could you repeat it?\n\n{}",
            last
        ),
        None => "I couldn't hear that clearly. Could you repeat it?".to_string(),
    }
}

/// The session id the client sent can no longer be used.
pub fn restart_required_notice() -> String {
    "This session is no longer available. Please start a new session to continue.".to_string()
}

/// Timeout resolved as "start fresh".
pub fn timeout_new_notice() -> String {
    "Okay, let's start fresh. Please begin a new session.".to_string()
}

/// Offers to end the session when nothing is left to do.
pub fn end_offer() -> String {
    "Alright. Is there anything else I can help with, or shall we end the session?".to_string()
}

/// The user declined the end-of-session offer.
pub fn anything_else_prompt() -> String {
    "Sure - what else can I help you with?".to_string()
}

/// Visible reply when the completion service fails.
pub fn apology_fallback() -> String {
    "Sorry, I'm having trouble responding right now. Please try again in a moment.".to_string()
}
