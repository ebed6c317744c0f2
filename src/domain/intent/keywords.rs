//! Curated multilingual keyword matching for short-text classification.
//!
//! Every matcher here is deterministic: lowercase, punctuation-stripped,
//! exact token-set matching against curated English/Malay word lists,
//! only attempted on short messages. The completion-service fallback for
//! paraphrases lives in the application layer; these lists are the fast
//! path and the degradation target when that service is down.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::domain::workflow::ServiceKind;

use super::intent::TimeoutChoice;

/// Maximum word count for a message to qualify as "short text".
const MAX_SHORT_WORDS: usize = 4;

static AFFIRMATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "yes", "yeah", "yup", "yep", "ok", "okay", "sure", "correct", "right", "confirm",
        "confirmed", "proceed", "ya", "betul", "boleh", "setuju", "teruskan", "sahkan", "ye",
    ])
});

static NEGATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "no", "nope", "nah", "wrong", "incorrect", "cancel", "tak", "tidak", "salah", "bukan",
        "batal", "jangan",
    ])
});

/// Rejection of a pending document's extracted data. Includes short
/// phrases, matched whole.
static REJECTION_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "wrong",
        "incorrect",
        "reject",
        "not correct",
        "thats wrong",
        "that is wrong",
        "salah",
        "tak betul",
        "tidak betul",
    ]
});

static TERMINATION_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "exit",
        "quit",
        "bye",
        "goodbye",
        "stop",
        "end",
        "end session",
        "end the session",
        "im done",
        "i am done",
        "keluar",
        "tamat",
        "berhenti",
        "selamat tinggal",
        "sudah siap",
    ]
});

/// Known upstream speech-to-text failure strings, matched exactly or by
/// containment.
static TRANSCRIPTION_FAILURE_MARKERS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "[inaudible]",
        "[transcription failed]",
        "[transcription error]",
        "transcription failed",
        "audio unclear",
        "audio not clear",
        "could not transcribe",
    ]
});

static TIMEOUT_CONTINUE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "continue",
        "resume",
        "yes",
        "ya",
        "sambung",
        "teruskan",
        "keep going",
    ]
});

static TIMEOUT_NEW: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "new",
        "new session",
        "start over",
        "start again",
        "restart",
        "start fresh",
        "baru",
        "sesi baru",
        "mula semula",
    ]
});

static LICENSE_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "renew license",
        "renew licence",
        "renew my license",
        "license renewal",
        "driving license",
        "driving licence",
        "lesen",
        "renew lesen",
        "perbaharui lesen",
        "lesen memandu",
    ]
});

static BILL_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "pay bill",
        "pay my bill",
        "bill payment",
        "tnb",
        "tnb bill",
        "electricity bill",
        "bayar bil",
        "bil elektrik",
        "bil tnb",
    ]
});

/// Ordinal words mapped to zero-based option indices.
static ORDINALS: Lazy<Vec<(&'static str, usize)>> = Lazy::new(|| {
    vec![
        ("first", 0),
        ("1st", 0),
        ("pertama", 0),
        ("second", 1),
        ("2nd", 1),
        ("kedua", 1),
        ("third", 2),
        ("3rd", 2),
        ("ketiga", 2),
        ("fourth", 3),
        ("4th", 3),
        ("keempat", 3),
        ("fifth", 4),
        ("5th", 4),
        ("kelima", 4),
    ]
});

/// Lowercases and strips punctuation, collapsing whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() || c == '[' || c == ']' {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if c == '\'' || c == '\u{2019}' {
            // Apostrophes vanish so "that's" matches "thats".
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

fn is_short(normalized: &str) -> bool {
    normalized.split_whitespace().count() <= MAX_SHORT_WORDS
}

/// Exact token-set match: every word of a short message must be in the
/// list.
fn token_set_match(text: &str, list: &HashSet<&str>) -> bool {
    let normalized = normalize(text);
    if normalized.is_empty() || !is_short(&normalized) {
        return false;
    }
    normalized.split_whitespace().all(|w| list.contains(w))
}

/// Whole-phrase match against a curated phrase list.
fn phrase_match(text: &str, phrases: &[&str]) -> bool {
    let normalized = normalize(text);
    if normalized.is_empty() || !is_short(&normalized) {
        return false;
    }
    phrases.contains(&normalized.as_str())
}

/// Short, low-ambiguity affirmative ("yes", "ok", "betul").
pub fn is_affirmative(text: &str) -> bool {
    token_set_match(text, &AFFIRMATIVE)
}

/// Short negative ("no", "tak", "cancel").
pub fn is_negative(text: &str) -> bool {
    token_set_match(text, &NEGATIVE)
}

/// Rejection of extracted document data.
pub fn is_rejection(text: &str) -> bool {
    phrase_match(text, &REJECTION_PHRASES)
}

/// Explicit end-of-session phrase.
pub fn is_termination(text: &str) -> bool {
    phrase_match(text, &TERMINATION_PHRASES)
}

/// Upstream transcription-failure marker, exact or by containment.
pub fn is_transcription_failure(text: &str) -> bool {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return false;
    }
    TRANSCRIPTION_FAILURE_MARKERS.iter().any(|marker| {
        let marker_norm = normalize(marker);
        normalized == marker_norm || normalized.contains(&marker_norm)
    })
}

/// Interprets the reply to the inactivity-timeout question.
pub fn timeout_choice(text: &str) -> TimeoutChoice {
    if phrase_match(text, &TIMEOUT_NEW) {
        TimeoutChoice::New
    } else if phrase_match(text, &TIMEOUT_CONTINUE) {
        TimeoutChoice::Continue
    } else {
        TimeoutChoice::Unclear
    }
}

/// Keyword-based fresh service detection from free text.
///
/// Unlike the short-text matchers this scans longer messages too, since
/// service requests are usually full sentences.
pub fn detect_service(text: &str) -> Option<ServiceKind> {
    let normalized = format!(" {} ", normalize(text));
    let hit = |phrases: &[&str]| {
        phrases
            .iter()
            .any(|p| normalized.contains(&format!(" {} ", p)))
    };
    if hit(&LICENSE_KEYWORDS) {
        Some(ServiceKind::LicenseRenewal)
    } else if hit(&BILL_KEYWORDS) {
        Some(ServiceKind::BillPayment)
    } else {
        None
    }
}

/// Resolves a message against presented options: by ordinal, by literal
/// value, or by natural-language containment.
pub fn select_option(text: &str, options: &[String]) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    // Literal value, anywhere in the message.
    let padded = format!(" {} ", normalized);
    for option in options {
        let option_norm = normalize(option);
        if !option_norm.is_empty() && padded.contains(&format!(" {} ", option_norm)) {
            return Some(option.clone());
        }
    }

    // Bare index ("1", "2") on a short message.
    if is_short(&normalized) {
        if let Ok(n) = normalized.trim().parse::<usize>() {
            if (1..=options.len()).contains(&n) {
                return Some(options[n - 1].clone());
            }
        }
        // Ordinal words ("first", "kedua", "the second one").
        for (word, index) in ORDINALS.iter() {
            if padded.contains(&format!(" {} ", word)) && *index < options.len() {
                return Some(options[*index].clone());
            }
        }
    }

    None
}
