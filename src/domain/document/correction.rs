//! Free-text correction parsing for document verification.
//!
//! Users correct extracted fields in prose ("name should be Ahmad, IC is
//! 900101-14-5678"). The parser segments the text, tries a fixed list of
//! pattern templates per segment, resolves the field token against the
//! document's existing keys (directly, via a synonym table, then by
//! substring), and propagates the original value's case style onto the
//! replacement. Unresolved tokens are dropped silently: partial
//! corrections are valid.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

/// Field synonyms, normalized token -> canonical field name.
///
/// Covers English and Malay labels users actually type.
static FIELD_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ic", "ic_number"),
        ("ic number", "ic_number"),
        ("ic no", "ic_number"),
        ("identity card", "ic_number"),
        ("identity card number", "ic_number"),
        ("mykad", "ic_number"),
        ("nric", "ic_number"),
        ("kad pengenalan", "ic_number"),
        ("name", "name"),
        ("full name", "name"),
        ("nama", "name"),
        ("address", "address"),
        ("alamat", "address"),
        ("license", "license_number"),
        ("licence", "license_number"),
        ("license number", "license_number"),
        ("lesen", "license_number"),
        ("no lesen", "license_number"),
        ("account", "account_number"),
        ("account number", "account_number"),
        ("account no", "account_number"),
        ("akaun", "account_number"),
        ("no akaun", "account_number"),
        ("amount", "amount"),
        ("jumlah", "amount"),
        ("expiry", "expiry_date"),
        ("expiry date", "expiry_date"),
        ("tarikh luput", "expiry_date"),
    ])
});

/// Leading qualifiers stripped before pattern matching
/// ("no, the name is Ahmad" / "wrong, IC is ...").
const QUALIFIERS: [&str; 8] = [
    "no,", "no ", "wrong,", "wrong ", "that's wrong,", "thats wrong,", "salah,", "salah ",
];

/// Parses free-text corrections against the current field map.
///
/// Returns only the fields that resolved to an existing key with a
/// non-empty replacement value, case-styled after the original.
pub fn parse_corrections(
    text: &str,
    existing: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut resolved = BTreeMap::new();

    for segment in split_segments(text) {
        let segment = strip_qualifiers(segment.trim());
        if segment.is_empty() {
            continue;
        }

        let Some((field_token, value)) = match_templates(segment) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if let Some(key) = resolve_field(&field_token, existing) {
            let styled = apply_case_style(existing.get(&key).map(String::as_str), value);
            resolved.insert(key, styled);
        }
    }

    resolved
}

/// Returns true if the text mentions any known field token.
///
/// The classifier uses this to keep a short affirmative from verifying a
/// document when the message actually names a field.
pub fn contains_field_token(text: &str, existing: &BTreeMap<String, String>) -> bool {
    let normalized = normalize_token(text);
    if normalized.is_empty() {
        return false;
    }
    let padded = format!(" {} ", normalized);

    for key in existing.keys() {
        let key_words = normalize_token(key);
        if !key_words.is_empty() && padded.contains(&format!(" {} ", key_words)) {
            return true;
        }
    }
    FIELD_SYNONYMS
        .keys()
        .any(|syn| padded.contains(&format!(" {} ", syn)))
}

/// Splits on the correction delimiters: newline, comma, semicolon, "and".
fn split_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for chunk in text.split(['\n', ',', ';']) {
        let mut rest = chunk;
        loop {
            match find_word(rest, " and ") {
                Some(pos) => {
                    segments.push(&rest[..pos]);
                    rest = &rest[pos + 5..];
                }
                None => {
                    segments.push(rest);
                    break;
                }
            }
        }
    }
    segments
}

/// ASCII case-insensitive search for a delimiter word.
///
/// The needle is always ASCII, so matching byte windows of the original
/// string keeps the returned offset valid for slicing it. Offsets taken
/// in a `to_lowercase()` copy would not be: Unicode case folding can
/// change a character's byte length.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// ASCII case-insensitive prefix test; same offset rules as [`find_word`].
fn starts_with_word(segment: &str, prefix: &str) -> bool {
    segment.len() >= prefix.len()
        && segment.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn strip_qualifiers(segment: &str) -> &str {
    for qualifier in QUALIFIERS {
        if starts_with_word(segment, qualifier) {
            return segment[qualifier.len()..].trim_start();
        }
    }
    segment
}

/// Ordered pattern templates; first match wins.
///
/// 1. `field: value`
/// 2. `fix/change/update field to value`
/// 3. `field should be value`
/// 4. `field is value`
fn match_templates(segment: &str) -> Option<(String, String)> {
    if let Some((field, value)) = segment.split_once(':') {
        return Some((field.trim().to_string(), value.trim().to_string()));
    }

    for verb in ["fix ", "change ", "update ", "tukar ", "betulkan "] {
        if starts_with_word(segment, verb) {
            let rest = &segment[verb.len()..];
            if let Some(pos) = find_word(rest, " to ") {
                return Some((
                    rest[..pos].trim().to_string(),
                    rest[pos + 4..].trim().to_string(),
                ));
            }
        }
    }

    if let Some(pos) = find_word(segment, " should be ") {
        return Some((
            segment[..pos].trim().to_string(),
            segment[pos + 11..].trim().to_string(),
        ));
    }

    if let Some(pos) = find_word(segment, " is ") {
        return Some((
            segment[..pos].trim().to_string(),
            segment[pos + 4..].trim().to_string(),
        ));
    }

    None
}

/// Resolves a field token against existing keys, then synonyms, then
/// substring containment.
fn resolve_field(token: &str, existing: &BTreeMap<String, String>) -> Option<String> {
    let token_norm = normalize_token(token);
    if token_norm.is_empty() {
        return None;
    }

    // 1. Direct match against an existing key.
    for key in existing.keys() {
        if normalize_token(key) == token_norm {
            return Some(key.clone());
        }
    }

    // 2. Synonym table, then match the canonical name against keys.
    if let Some(canonical) = FIELD_SYNONYMS.get(token_norm.as_str()) {
        let canonical_norm = normalize_token(canonical);
        for key in existing.keys() {
            let key_norm = normalize_token(key);
            if key_norm == canonical_norm || key_norm.contains(&canonical_norm) {
                return Some(key.clone());
            }
        }
    }

    // 3. Substring containment, both directions.
    if token_norm.len() >= 3 {
        for key in existing.keys() {
            let key_norm = normalize_token(key);
            if key_norm.contains(&token_norm) || token_norm.contains(&key_norm) {
                return Some(key.clone());
            }
        }
    }

    None
}

/// Lowercased, punctuation collapsed to single spaces.
fn normalize_token(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_space = true;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Propagates the original value's case style onto the replacement.
fn apply_case_style(original: Option<&str>, replacement: &str) -> String {
    let Some(original) = original.filter(|o| o.chars().any(|c| c.is_alphabetic())) else {
        return replacement.to_string();
    };

    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.iter().all(|c| c.is_uppercase()) {
        replacement.to_uppercase()
    } else if letters.iter().all(|c| c.is_lowercase()) {
        replacement.to_lowercase()
    } else if is_title_case(original) {
        title_case(replacement)
    } else {
        replacement.to_string()
    }
}

fn is_title_case(s: &str) -> bool {
    s.split_whitespace().all(|word| {
        let mut chars = word.chars().filter(|c| c.is_alphabetic());
        match chars.next() {
            Some(first) => first.is_uppercase() && chars.all(|c| c.is_lowercase()),
            None => true,
        }
    })
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("name".to_string(), "Ahmad Bin Ali".to_string()),
            ("ic_number".to_string(), "900101-14-5678".to_string()),
            ("address".to_string(), "12 JALAN MERDEKA".to_string()),
        ])
    }

    #[test]
    fn colon_template_resolves_direct_field() {
        let parsed = parse_corrections("name: Siti Binti Omar", &fields());
        assert_eq!(parsed["name"], "Siti Binti Omar");
    }

    #[test]
    fn should_be_template_works() {
        let parsed = parse_corrections("name should be siti binti omar", &fields());
        // Title-case of the original is propagated.
        assert_eq!(parsed["name"], "Siti Binti Omar");
    }

    #[test]
    fn is_template_with_synonym_resolves_ic() {
        let parsed = parse_corrections("IC is 880202-10-1234", &fields());
        assert_eq!(parsed["ic_number"], "880202-10-1234");
    }

    #[test]
    fn change_to_template_works() {
        let parsed = parse_corrections("change address to 5 lorong damai", &fields());
        // Original was all caps.
        assert_eq!(parsed["address"], "5 LORONG DAMAI");
    }

    #[test]
    fn wrong_qualifier_is_stripped() {
        let parsed = parse_corrections("wrong, name is Siti", &fields());
        assert_eq!(parsed["name"], "Siti");
    }

    #[test]
    fn multiple_segments_parse_independently() {
        let parsed = parse_corrections(
            "name: Siti Binti Omar, IC should be 880202-10-1234 and address is 5 LORONG DAMAI",
            &fields(),
        );
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["ic_number"], "880202-10-1234");
    }

    #[test]
    fn unresolved_tokens_are_dropped_silently() {
        let parsed = parse_corrections("passport: A1234567, name: Siti", &fields());
        assert_eq!(parsed.len(), 1);
        assert!(parsed.contains_key("name"));
    }

    #[test]
    fn empty_values_are_dropped() {
        let parsed = parse_corrections("name:   ", &fields());
        assert!(parsed.is_empty());
    }

    #[test]
    fn plain_chatter_yields_nothing() {
        assert!(parse_corrections("thank you very much", &fields()).is_empty());
        assert!(parse_corrections("yes", &fields()).is_empty());
    }

    #[test]
    fn substring_resolution_matches_partial_field_names() {
        let fields = BTreeMap::from([("account_number".to_string(), "123456".to_string())]);
        let parsed = parse_corrections("account: 654321", &fields);
        assert_eq!(parsed["account_number"], "654321");
    }

    #[test]
    fn all_caps_style_is_propagated() {
        let fields = BTreeMap::from([("name".to_string(), "AHMAD BIN ALI".to_string())]);
        let parsed = parse_corrections("name: siti binti omar", &fields);
        assert_eq!(parsed["name"], "SITI BINTI OMAR");
    }

    #[test]
    fn lowercase_style_is_propagated() {
        let fields = BTreeMap::from([("email".to_string(), "ahmad@example.my".to_string())]);
        let parsed = parse_corrections("email: SITI@EXAMPLE.MY", &fields);
        assert_eq!(parsed["email"], "siti@example.my");
    }

    #[test]
    fn numeric_original_keeps_replacement_as_typed() {
        let parsed = parse_corrections("ic_number: 880202-10-1234x", &fields());
        assert_eq!(parsed["ic_number"], "880202-10-1234x");
    }

    #[test]
    fn delimiters_match_regardless_of_ascii_case() {
        let parsed = parse_corrections("name SHOULD BE siti AND IC Is 880202-10-1234", &fields());
        assert_eq!(parsed["name"], "Siti");
        assert_eq!(parsed["ic_number"], "880202-10-1234");
    }

    #[test]
    fn unicode_case_folding_that_changes_byte_length_is_handled() {
        // U+023A lowercases to U+2C65, which is one byte longer in
        // UTF-8; offsets must come from the original string.
        assert!(parse_corrections("ȺȺ is x", &fields()).is_empty());
        assert!(parse_corrections("İsim should be Siti and ȺȺ is x", &fields()).is_empty());
        let parsed = parse_corrections("Ⱥ, name is Siti", &fields());
        assert_eq!(parsed["name"], "Siti");
    }

    #[test]
    fn contains_field_token_detects_synonyms_and_keys() {
        assert!(contains_field_token("the IC looks wrong", &fields()));
        assert!(contains_field_token("my name", &fields()));
        assert!(!contains_field_token("yes", &fields()));
        assert!(!contains_field_token("ok proceed", &fields()));
    }
}
