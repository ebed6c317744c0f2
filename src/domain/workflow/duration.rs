//! Renewal duration parsing.
//!
//! Accepts digits or number words in English and Malay, bounded to
//! [1, 10] years. Anything else is an invalid-format error that leaves
//! the workflow state unchanged and re-prompts.

use crate::domain::foundation::ValidationError;

/// Inclusive bounds on renewal duration in years.
pub const MIN_YEARS: u8 = 1;
pub const MAX_YEARS: u8 = 10;

const NUMBER_WORDS: [(&str, u8); 20] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("satu", 1),
    ("dua", 2),
    ("tiga", 3),
    ("empat", 4),
    ("lima", 5),
    ("enam", 6),
    ("tujuh", 7),
    ("lapan", 8),
    ("sembilan", 9),
    ("sepuluh", 10),
];

/// Parses a duration in years from free text ("3", "three years",
/// "tiga tahun").
///
/// # Errors
///
/// - `OutOfRange` when a number was found but lies outside [1, 10]
/// - `InvalidFormat` when no number could be recognized
pub fn parse_duration_years(text: &str) -> Result<u8, ValidationError> {
    let lowered = text.to_lowercase();

    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }

        if let Ok(n) = token.parse::<i64>() {
            return bounded(n);
        }
        if let Some((_, n)) = NUMBER_WORDS.iter().find(|(word, _)| *word == token) {
            return Ok(*n);
        }
    }

    Err(ValidationError::invalid_format(
        "duration_years",
        "expected a number of years",
    ))
}

fn bounded(n: i64) -> Result<u8, ValidationError> {
    if (MIN_YEARS as i64..=MAX_YEARS as i64).contains(&n) {
        Ok(n as u8)
    } else {
        Err(ValidationError::out_of_range(
            "duration_years",
            MIN_YEARS as i32,
            MAX_YEARS as i32,
            n.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        ))
    }
}
